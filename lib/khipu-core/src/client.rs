//! Transport trait.
//!
//! The core never touches the network. It hands a fully built [`Request`] to
//! an [`HttpClient`] and interprets whatever comes back. Connection pooling,
//! TLS, timeouts and retry/backoff are the implementation's business.

use std::future::Future;

use crate::{Request, Response, Result};

/// Transport capability performing the network exchange.
///
/// Implementations may retry internally; to the caller a call is a single
/// opaque exchange.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
///
/// use khipu_core::{HttpClient, Request, Response, Result};
///
/// /// Answers every request with an empty bank list.
/// struct Canned;
///
/// impl HttpClient for Canned {
///     async fn execute_with_retries(&self, _request: Request) -> Result<Response> {
///         Ok(Response::new(200, HashMap::new(), r#"{"banks":[]}"#))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Send the request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ApiConnection`] when no response could be
    /// obtained (network, TLS or timeout failure).
    fn execute_with_retries(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response>> + Send;
}

impl<C: HttpClient> HttpClient for std::sync::Arc<C> {
    fn execute_with_retries(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response>> + Send {
        self.as_ref().execute_with_retries(request)
    }
}
