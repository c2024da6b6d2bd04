//! Async client for the Khipu payments API.
//!
//! [`KhipuClient`] is the entry point. Requests are built by
//! [`khipu_core`], sent by a [`HttpClient`] (by default the shared
//! [`HyperClient`], with pooling, TLS and retries) and decoded into a
//! [`KhipuResponse`] or a classified [`Error`].
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> khipu::Result<()> {
//! use khipu::prelude::*;
//!
//! let client = KhipuClient::builder("my-api-key")
//!     .app_info(AppInfo::new("shop").version("1.2.0"))
//!     .build();
//!
//! let response = client
//!     .raw_request(
//!         "get",
//!         "/v3/payments/p_1",
//!         Params::new(),
//!         RequestOptions::new(),
//!     )
//!     .await?;
//! let status = response.data().and_then(|data| data.get("status"));
//! tracing::info!(?status, "payment status");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
mod default_client;
mod khipu_client;
pub mod prelude;
mod requestor;
pub mod resources;
mod retry;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use default_client::default_http_client;
pub use khipu_client::{KhipuClient, KhipuClientBuilder};
pub use requestor::ApiRequestor;
pub use retry::RetryPolicy;

// Re-export tower for custom transports
pub use tower;

// Re-export core types
pub use khipu_core::{
    API_KEY_HEADER, ApiMode, AppInfo, BaseAddress, BaseAddresses, DEFAULT_API_BASE, Error,
    ErrorDetails, ErrorObject, HttpClient, IDEMPOTENCY_KEY_HEADER, JSON_CONTENT_TYPE,
    KhipuResponse, Method, ParamValue, Params, Request, RequestBuilder, RequestOptions,
    RequestorOptions, Response, Result, USER_AGENT, api_encode, classify_error, encode_timestamp,
    from_json, interpret_response, parse_query, to_json, to_query_string,
};
