//! Prelude module for convenient imports.
//!
//! ```ignore
//! use khipu_core::prelude::*;
//! ```

pub use crate::{
    ApiMode, AppInfo, BaseAddress, Error, HttpClient, KhipuResponse, Method, ParamValue, Params,
    Request, RequestBuilder, RequestOptions, RequestorOptions, Response, Result,
};
