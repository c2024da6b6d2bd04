//! Response envelope and interpretation.
//!
//! [`interpret_response`] turns a raw transport [`Response`] into a
//! [`KhipuResponse`]. Non-2xx statuses never come back as a value: they are
//! handed to [`classify_error`] and returned as the matching [`Error`].

use std::collections::HashMap;

use crate::{ApiMode, Error, ErrorDetails, Response, Result, classify_error, from_json};

/// Decoded response: text body, status, headers and the body parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct KhipuResponse {
    body: String,
    status: u16,
    headers: HashMap<String, String>,
    data: Option<serde_json::Value>,
}

impl KhipuResponse {
    /// Creates an envelope; `data` is filled when the body is valid JSON.
    #[must_use]
    pub fn new(body: impl Into<String>, status: u16, headers: HashMap<String, String>) -> Self {
        let body = body.into();
        let data = serde_json::from_str(&body).ok();
        Self {
            body,
            status,
            headers,
            data,
        }
    }

    /// Body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Body parsed as JSON, if it parses.
    #[must_use]
    pub const fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Hydrate the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] with the failing path.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        from_json(self.body.as_bytes())
    }
}

/// Decode a transport response, classifying non-2xx statuses.
///
/// # Errors
///
/// - [`Error::Api`] if the body is not valid UTF-8,
/// - the classified error kind if the status is outside `200..300`.
pub fn interpret_response(response: Response, api_mode: ApiMode) -> Result<KhipuResponse> {
    let (status, headers, body) = response.into_parts();

    let Ok(text) = std::str::from_utf8(&body) else {
        let lossy = String::from_utf8_lossy(&body).into_owned();
        let details = ErrorDetails::new(format!(
            "Invalid response body from API: {lossy} (HTTP response code was {status})"
        ))
        .with_http(lossy, status, headers);
        return Err(Error::Api(Box::new(details)));
    };

    let response = KhipuResponse::new(text, status, headers);
    if !response.is_success() {
        return Err(classify_error(&response, api_mode));
    }
    Ok(response)
}
