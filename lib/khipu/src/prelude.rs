//! Prelude module for convenient imports.
//!
//! ```
//! use khipu::prelude::*;
//! ```

pub use crate::{
    ApiMode, AppInfo, BaseAddress, Error, HttpClient, HyperClient, KhipuClient, KhipuResponse,
    Method, ParamValue, Params, RequestOptions, Result,
    resources::{Bank, BankType, BanksResponse},
};
pub use serde::{Deserialize, Serialize};
