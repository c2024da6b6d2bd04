//! Error classification for non-2xx responses.
//!
//! Both API modes share one status table. V2 is kept as a separate entry
//! point so it can diverge later; for now it only logs its own marker before
//! falling through to the shared table.

use serde_json::Value;
use tracing::info;

use crate::{ApiMode, Error, ErrorDetails, KhipuResponse};

/// The `error` object of a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorObject {
    /// Error type (e.g. `idempotency_error`).
    pub error_type: Option<String>,
    /// Error code (e.g. `rate_limit`).
    pub code: Option<String>,
    /// Human readable message.
    pub message: Option<String>,
    /// Offending parameter.
    pub param: Option<String>,
}

impl ErrorObject {
    /// Extract the `error` object from a decoded body.
    ///
    /// Returns `None` when the body is not an object or has no `error`
    /// object.
    #[must_use]
    pub fn extract(data: Option<&Value>) -> Option<Self> {
        let error = data?.get("error")?.as_object()?;
        let field = |name: &str| error.get(name).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            error_type: field("type"),
            code: field("code"),
            message: field("message"),
            param: field("param"),
        })
    }
}

/// Map a failed response to its error kind.
///
/// There is no success outcome: the return value is always the error to
/// hand back to the caller.
#[must_use]
pub fn classify_error(response: &KhipuResponse, api_mode: ApiMode) -> Error {
    let status = response.status();
    let exchange = || {
        ErrorDetails::default()
            .with_http(response.body(), status, response.headers().clone())
            .with_json_body(response.data().cloned())
    };

    let Some(error) = ErrorObject::extract(response.data()) else {
        let details = ErrorDetails {
            message: Some(format!(
                "Invalid response object from API: {:?} (HTTP response code was {status})",
                response.body()
            )),
            ..exchange()
        };
        return Error::Api(Box::new(details));
    };

    if api_mode == ApiMode::V2 {
        info!(
            error_code = error.code.as_deref(),
            error_type = error.error_type.as_deref(),
            "Khipu v2 API error received"
        );
    }

    info!(
        %api_mode,
        status,
        error_code = error.code.as_deref(),
        error_type = error.error_type.as_deref(),
        error_message = error.message.as_deref(),
        error_param = error.param.as_deref(),
        "Khipu API error received"
    );

    let details = ErrorDetails {
        message: error.message.clone(),
        code: error.code.clone(),
        param: error.param.clone(),
        error_type: error.error_type.clone(),
        ..exchange()
    };
    error_for_status(status, &error, Box::new(details))
}

fn error_for_status(status: u16, error: &ErrorObject, details: Box<ErrorDetails>) -> Error {
    let code = error.code.as_deref();
    let error_type = error.error_type.as_deref();

    match status {
        429 => Error::RateLimit(details),
        // Rate limits used to be reported as 400 with code `rate_limit`.
        400 if code == Some("rate_limit") => Error::RateLimit(details),
        400 | 404 if error_type == Some("idempotency_error") => Error::Idempotency(details),
        400 | 404 => Error::InvalidRequest(details),
        401 => Error::Authentication(details),
        402 => Error::Card(details),
        403 => Error::Permission(details),
        _ => Error::Api(details),
    }
}
