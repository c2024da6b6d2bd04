//! API protocol variants.

use derive_more::Display;

/// Protocol variant of an endpoint, inferred from its path.
///
/// Selects the error classification entry point and the list encoding
/// used for query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ApiMode {
    /// Classic endpoints.
    #[default]
    #[display("V1")]
    V1,
    /// Endpoints under `/v2`.
    #[display("V2")]
    V2,
}

impl ApiMode {
    /// Infer the mode from a request path (query string allowed).
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("/v2") {
            Self::V2
        } else {
            Self::V1
        }
    }
}
