//! Process-wide default transport.

use std::sync::OnceLock;

use tracing::debug;

use crate::HyperClient;

static DEFAULT_HTTP_CLIENT: OnceLock<HyperClient> = OnceLock::new();

/// Get the shared default transport, creating it on first use.
///
/// The client is built at most once per process, even when several threads
/// race on the first call. Every requestor without an explicit transport
/// shares it, and with it the connection pool.
pub fn default_http_client() -> &'static HyperClient {
    DEFAULT_HTTP_CLIENT.get_or_init(|| {
        debug!("Creating default Khipu HTTP client");
        HyperClient::new()
    })
}
