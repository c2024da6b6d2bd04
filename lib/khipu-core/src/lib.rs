//! Request encoding and error classification core for the Khipu client.
//!
//! This crate is free of I/O. It provides:
//! - [`Params`] and [`api_encode`] - bracketed parameter flattening
//! - [`RequestBuilder`] and [`Request`] - resolved method, URL, headers, body
//! - [`RequestorOptions`] and [`RequestOptions`] - defaults and per-call overrides
//! - [`HttpClient`] - the transport capability implemented elsewhere
//! - [`interpret_response`] and [`KhipuResponse`] - response decoding
//! - [`classify_error`] and [`Error`] - the error taxonomy

mod api_mode;
mod body;
mod classify;
mod client;
mod encode;
mod envelope;
mod error;
mod method;
mod options;
pub mod prelude;
mod request;
mod response;

pub use api_mode::ApiMode;
pub use body::{JSON_CONTENT_TYPE, from_json, to_json};
pub use classify::{ErrorObject, classify_error};
pub use client::HttpClient;
pub use encode::{ParamValue, Params, api_encode, encode_timestamp, parse_query, to_query_string};
pub use envelope::{KhipuResponse, interpret_response};
pub use error::{Error, ErrorDetails, Result};
pub use method::Method;
pub use options::{
    AppInfo, BaseAddress, BaseAddresses, DEFAULT_API_BASE, RequestOptions, RequestorOptions,
};
pub use request::{API_KEY_HEADER, IDEMPOTENCY_KEY_HEADER, Request, RequestBuilder, USER_AGENT};
pub use response::Response;
