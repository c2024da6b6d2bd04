//! HTTP request building.
//!
//! [`RequestBuilder`] resolves a call (method, path, parameters, per-call
//! overrides) against the requestor defaults and produces the final
//! [`Request`]: absolute URL, headers and body.
//!
//! # Example
//!
//! ```
//! use khipu_core::{Method, Params, RequestBuilder, RequestorOptions};
//!
//! let defaults = RequestorOptions::new().api_key("my-key");
//! let request = RequestBuilder::new(Method::Get, "/v3/banks")
//!     .params(Params::new().with("page", 2))
//!     .build(&defaults)
//!     .expect("request");
//!
//! assert_eq!(request.url().as_str(), "https://payment-api.khipu.com/v3/banks?page=2");
//! ```

use bytes::Bytes;
use indexmap::IndexMap;
use url::Url;

use crate::{
    ApiMode, BaseAddress, Error, Method, Params, RequestOptions, RequestorOptions, Result,
    api_encode, body::JSON_CONTENT_TYPE, parse_query, to_json, to_query_string,
};

/// Library identifier sent in the `User-Agent` header.
pub const USER_AGENT: &str = concat!("khipu/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// A fully resolved request, ready for the transport.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: IndexMap<String, String>,
    body: Option<Bytes>,
    encoded_params: String,
    api_mode: ApiMode,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers, in sending order.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Single header value by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body (POST only).
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Flattened parameters, for logging.
    #[must_use]
    pub fn encoded_params(&self) -> &str {
        &self.encoded_params
    }

    /// Protocol variant of the call.
    #[must_use]
    pub const fn api_mode(&self) -> ApiMode {
        self.api_mode
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, IndexMap<String, String>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    params: Params,
    options: RequestOptions,
    base_address: BaseAddress,
    api_mode: Option<ApiMode>,
}

impl RequestBuilder {
    /// Creates a new builder for a path relative to a base address.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            options: RequestOptions::default(),
            base_address: BaseAddress::default(),
            api_mode: None,
        }
    }

    /// Sets the parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the per-call overrides.
    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the base-address slot.
    #[must_use]
    pub const fn base_address(mut self, base_address: BaseAddress) -> Self {
        self.base_address = base_address;
        self
    }

    /// Forces the protocol variant instead of inferring it from the path.
    #[must_use]
    pub const fn api_mode(mut self, api_mode: ApiMode) -> Self {
        self.api_mode = Some(api_mode);
        self
    }

    /// Builds the [`Request`] against the requestor defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if no API key is resolvable,
    /// - [`Error::Configuration`] if the base-address slot is not configured,
    /// - [`Error::InvalidUrl`] if base address and path do not form a URL.
    pub fn build(self, defaults: &RequestorOptions) -> Result<Request> {
        let options = defaults.merge(&self.options);
        let Some(api_key) = options.resolved_api_key() else {
            return Err(Error::authentication("No API key provided."));
        };

        let api_mode = self
            .api_mode
            .unwrap_or_else(|| ApiMode::from_path(&self.path));

        let base = options
            .base_addresses
            .get(self.base_address)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "no base address configured for slot `{}`",
                    self.base_address
                ))
            })?;
        let mut url = Url::parse(&format!("{base}{}", self.path))?;

        let mut params = self.params;
        let replace_query = self.method.sends_query() && !params.is_empty();
        if replace_query {
            // The path may come from the server (e.g. a next page link):
            // its query is merged under the caller parameters.
            let existing = url.query().map(parse_query).unwrap_or_default();
            params = existing.merge(params);
        }

        let encoded_params = to_query_string(&api_encode(&params, api_mode))?;

        let body = match self.method {
            Method::Get | Method::Delete => {
                if replace_query {
                    url.set_query(Some(encoded_params.as_str()).filter(|query| !query.is_empty()));
                }
                None
            }
            Method::Post => Some(to_json(&params)?),
        };

        let mut headers = request_headers(api_key, &options);
        if let Some(idempotency_key) = &self.options.idempotency_key {
            headers.insert(IDEMPOTENCY_KEY_HEADER.to_string(), idempotency_key.clone());
        }
        headers.extend(
            options
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        Ok(Request {
            method: self.method,
            url,
            headers,
            body,
            encoded_params,
            api_mode,
        })
    }
}

fn request_headers(api_key: &str, options: &RequestorOptions) -> IndexMap<String, String> {
    let user_agent = match &options.app_info {
        Some(app_info) => format!("{USER_AGENT} {app_info}"),
        None => USER_AGENT.to_string(),
    };

    let mut headers = IndexMap::new();
    headers.insert("User-Agent".to_string(), user_agent);
    headers.insert(API_KEY_HEADER.to_string(), api_key.to_string());
    headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
    headers
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{AppInfo, BaseAddresses, ParamValue};

    fn defaults() -> RequestorOptions {
        RequestorOptions::new()
            .api_key("test-key")
            .base_address(BaseAddress::Api, "https://api.example.com")
    }

    #[test]
    fn get_merges_server_query_with_params() {
        let request = RequestBuilder::new(Method::Get, "/v1/payments?expand[]=a&expand[]=b")
            .params(Params::new().with("status", "paid"))
            .build(&defaults())
            .expect("request");

        check!(request.url().query() == Some("expand[]=a&expand[]=b&status=paid"));
        check!(request.encoded_params() == "expand[]=a&expand[]=b&status=paid");
        check!(request.body().is_none());

        let reparsed = parse_query(request.url().query().unwrap_or_default());
        check!(reparsed.get("expand") == Some(&ParamValue::from(vec!["a", "b"])));
        check!(reparsed.get("status") == Some(&ParamValue::from("paid")));
    }

    #[test]
    fn caller_params_win_over_server_query() {
        let request = RequestBuilder::new(Method::Get, "/v1/payments?page=2&status=pending")
            .params(Params::new().with("status", "paid"))
            .build(&defaults())
            .expect("request");

        check!(request.url().query() == Some("page=2&status=paid"));
    }

    #[test]
    fn get_without_params_keeps_path_query() {
        let request = RequestBuilder::new(Method::Get, "/v1/payments?page=2")
            .build(&defaults())
            .expect("request");

        check!(request.url().as_str() == "https://api.example.com/v1/payments?page=2");
        check!(request.encoded_params().is_empty());
    }

    #[test]
    fn delete_sends_params_in_query() {
        let request = RequestBuilder::new(Method::Delete, "/v3/payments/p_1")
            .params(Params::new().with("reason", "duplicate"))
            .build(&defaults())
            .expect("request");

        check!(request.method() == Method::Delete);
        check!(request.url().query() == Some("reason=duplicate"));
        check!(request.body().is_none());
    }

    #[test]
    fn v2_paths_repeat_list_keys() {
        let request = RequestBuilder::new(Method::Get, "/v2/events")
            .params(Params::new().with("types", vec!["a", "b"]))
            .build(&defaults())
            .expect("request");

        check!(request.api_mode() == ApiMode::V2);
        check!(request.url().query() == Some("types=a&types=b"));
    }

    #[test]
    fn post_sends_json_body_and_keeps_query() {
        let request = RequestBuilder::new(Method::Post, "/v3/payments?source=sdk")
            .params(
                Params::new()
                    .with("amount", 1000)
                    .with("currency", "CLP")
                    .with("subject", "Order 42"),
            )
            .build(&defaults())
            .expect("request");

        check!(request.url().query() == Some("source=sdk"));
        let_assert!(Some(body) = request.body());
        check!(body.as_ref() == br#"{"amount":1000,"currency":"CLP","subject":"Order 42"}"#);
        check!(request.encoded_params() == "amount=1000&currency=CLP&subject=Order+42");
    }

    #[test]
    fn post_without_params_sends_empty_object() {
        let request = RequestBuilder::new(Method::Post, "/v3/payments/p_1/confirm")
            .build(&defaults())
            .expect("request");

        check!(request.body().map(|body| body.to_vec()) == Some(b"{}".to_vec()));
    }

    #[test]
    fn headers_in_order_and_overridable() {
        let defaults = defaults().header("X-Shop", "one");
        let request = RequestBuilder::new(Method::Post, "/v3/payments")
            .options(
                RequestOptions::new()
                    .idempotency_key("idem-1")
                    .header("Content-Type", "application/json; charset=utf-8")
                    .header("x-trace", "t-1"),
            )
            .build(&defaults)
            .expect("request");

        let names: Vec<&str> = request.headers().keys().map(String::as_str).collect();
        check!(
            names == vec!["User-Agent", "x-api-key", "Content-Type", "Idempotency-Key", "X-Shop", "x-trace"]
        );
        check!(request.header("User-Agent") == Some(USER_AGENT));
        check!(request.header("x-api-key") == Some("test-key"));
        check!(request.header("Content-Type") == Some("application/json; charset=utf-8"));
        check!(request.header("Idempotency-Key") == Some("idem-1"));
        check!(request.header("content-type").is_none());
    }

    #[test]
    fn per_call_api_key_wins() {
        let request = RequestBuilder::new(Method::Get, "/v3/banks")
            .options(RequestOptions::new().api_key("call-key"))
            .build(&defaults())
            .expect("request");

        check!(request.header(API_KEY_HEADER) == Some("call-key"));
    }

    #[test]
    fn user_agent_embeds_app_info() {
        let defaults = defaults().app_info(AppInfo::new("shop").version("2.0").url("https://shop.example"));
        let request = RequestBuilder::new(Method::Get, "/v3/banks")
            .build(&defaults)
            .expect("request");

        let expected = format!("{USER_AGENT} shop/2.0 (https://shop.example)");
        check!(request.header("User-Agent") == Some(expected.as_str()));
    }

    #[test]
    fn missing_api_key_fails() {
        let defaults = RequestorOptions::new();
        let result = RequestBuilder::new(Method::Get, "/v3/banks").build(&defaults);

        let_assert!(Err(Error::Authentication(details)) = result);
        check!(details.message.as_deref() == Some("No API key provided."));
    }

    #[test]
    fn missing_base_address_fails() {
        let defaults = RequestorOptions::new()
            .api_key("test-key")
            .base_addresses(BaseAddresses::empty());
        let result = RequestBuilder::new(Method::Get, "/v3/banks").build(&defaults);

        let_assert!(Err(Error::Configuration(message)) = result);
        check!(message.contains("`api`"));
    }

    #[test]
    fn absolute_url_joins_base_and_path() {
        let request = RequestBuilder::new(Method::Get, "/v3/banks")
            .build(&RequestorOptions::new().api_key("k"))
            .expect("request");

        check!(request.url().as_str() == "https://payment-api.khipu.com/v3/banks");
    }
}
