//! Error types for the Khipu client.

use std::collections::HashMap;
use std::fmt;

use derive_more::{Display, Error, From};

// ============================================================================
// Error Details
// ============================================================================

/// Diagnostic context attached to every API-level error.
///
/// Keeps the raw HTTP exchange so callers can log a failure without
/// re-fetching it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorDetails {
    /// Human readable message, as sent by the API when available.
    pub message: Option<String>,
    /// API error code (e.g. `rate_limit`).
    pub code: Option<String>,
    /// Name of the offending request parameter.
    pub param: Option<String>,
    /// API error type (e.g. `idempotency_error`).
    pub error_type: Option<String>,
    /// Raw response body.
    pub http_body: Option<String>,
    /// HTTP status code.
    pub http_status: Option<u16>,
    /// Response body decoded as JSON.
    pub json_body: Option<serde_json::Value>,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

impl ErrorDetails {
    /// Details with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach the HTTP exchange that produced the error.
    #[must_use]
    pub fn with_http(
        mut self,
        body: impl Into<String>,
        status: u16,
        headers: HashMap<String, String>,
    ) -> Self {
        self.http_body = Some(body.into());
        self.http_status = Some(status);
        self.headers = headers;
        self
    }

    /// Attach the decoded JSON body.
    #[must_use]
    pub fn with_json_body(mut self, json_body: Option<serde_json::Value>) -> Self {
        self.json_body = json_body;
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.as_deref().unwrap_or("<empty message>");
        match self.http_status {
            Some(status) => write!(f, "{message} (HTTP {status})"),
            None => write!(f, "{message}"),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for Khipu operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Missing or rejected credentials (401, or no API key before dispatch).
    #[display("authentication error: {_0}")]
    #[from(skip)]
    Authentication(#[error(not(source))] Box<ErrorDetails>),

    /// Bad request parameters (400/404).
    #[display("invalid request error: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] Box<ErrorDetails>),

    /// Too many requests (429, or 400 with code `rate_limit`).
    #[display("rate limit error: {_0}")]
    #[from(skip)]
    RateLimit(#[error(not(source))] Box<ErrorDetails>),

    /// Idempotency key reused with different parameters.
    #[display("idempotency error: {_0}")]
    #[from(skip)]
    Idempotency(#[error(not(source))] Box<ErrorDetails>),

    /// Payment specific failure (402).
    #[display("card error: {_0}")]
    #[from(skip)]
    Card(#[error(not(source))] Box<ErrorDetails>),

    /// Credentials lack the permission for this call (403).
    #[display("permission error: {_0}")]
    #[from(skip)]
    Permission(#[error(not(source))] Box<ErrorDetails>),

    /// Transport failure or protocol misuse.
    #[display("API connection error: {_0}")]
    #[from(skip)]
    ApiConnection(#[error(not(source))] Box<ErrorDetails>),

    /// Any other API failure, including malformed responses.
    #[display("API error: {_0}")]
    #[from(skip)]
    Api(#[error(not(source))] Box<ErrorDetails>),

    /// Client misconfiguration.
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "banks[0].name").
        path: String,
        /// Error message.
        message: String,
    },

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(Box::new(ErrorDetails::new(message)))
    }

    /// Create an API connection error.
    #[must_use]
    pub fn api_connection(message: impl Into<String>) -> Self {
        Self::ApiConnection(Box::new(ErrorDetails::new(message)))
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// API details carried by the error, if it is one of the API kinds.
    #[must_use]
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::Authentication(details)
            | Self::InvalidRequest(details)
            | Self::RateLimit(details)
            | Self::Idempotency(details)
            | Self::Card(details)
            | Self::Permission(details)
            | Self::ApiConnection(details)
            | Self::Api(details) => Some(details),
            _ => None,
        }
    }

    /// HTTP status code of the response that caused the error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.details().and_then(|details| details.http_status)
    }

    /// API error code.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.details().and_then(|details| details.code.as_deref())
    }

    /// Offending parameter name.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        self.details().and_then(|details| details.param.as_deref())
    }

    /// Raw response body.
    #[must_use]
    pub fn http_body(&self) -> Option<&str> {
        self.details().and_then(|details| details.http_body.as_deref())
    }

    /// Response headers, if the error came from an HTTP response.
    #[must_use]
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.details()
            .filter(|details| details.http_status.is_some())
            .map(|details| &details.headers)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::ApiConnection(_))
    }

    /// Returns `true` if this is a rate limit error.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit(_))
    }
}
