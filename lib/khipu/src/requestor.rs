//! Request execution against the Khipu API.

use tracing::{debug, info};

use crate::{
    ApiMode, BaseAddress, HttpClient, HyperClient, KhipuResponse, Method, Params, RequestBuilder,
    RequestOptions, RequestorOptions, Response, Result, default_http_client, interpret_response,
};

/// Builds requests from the configured defaults and hands them to a
/// transport.
///
/// Without an explicit transport the process-wide [`default_http_client`]
/// is used.
#[derive(Debug, Clone)]
pub struct ApiRequestor<C = HyperClient> {
    options: RequestorOptions,
    client: Option<C>,
}

impl ApiRequestor {
    /// Create a requestor using the default transport.
    #[must_use]
    pub const fn new(options: RequestorOptions) -> Self {
        Self {
            options,
            client: None,
        }
    }
}

impl<C: HttpClient> ApiRequestor<C> {
    /// Create a requestor using the given transport.
    #[must_use]
    pub const fn with_client(options: RequestorOptions, client: C) -> Self {
        Self {
            options,
            client: Some(client),
        }
    }

    /// Create a requestor from its parts; `None` selects the default
    /// transport.
    pub(crate) const fn from_parts(options: RequestorOptions, client: Option<C>) -> Self {
        Self { options, client }
    }

    /// Requestor defaults.
    #[must_use]
    pub const fn options(&self) -> &RequestorOptions {
        &self.options
    }

    /// Build and send a request, returning the raw response.
    ///
    /// The API mode is derived from `path`. Credentials and the base address
    /// are resolved before the transport is called.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Authentication`] if no API key is configured,
    /// - [`crate::Error::Configuration`] if `base_address` has no URL,
    /// - [`crate::Error::ApiConnection`] if the transport gets no response.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        params: Params,
        options: &RequestOptions,
        base_address: BaseAddress,
    ) -> Result<Response> {
        let api_mode = ApiMode::from_path(path);
        let request = RequestBuilder::new(method, path)
            .params(params)
            .options(options.clone())
            .base_address(base_address)
            .api_mode(api_mode)
            .build(&self.options)?;

        let url = request.url().clone();
        info!(%method, %url, "Request to Khipu api");
        debug!(post_data = request.encoded_params(), %api_mode, "Payload");

        let response = match &self.client {
            Some(client) => client.execute_with_retries(request).await?,
            None => default_http_client().execute_with_retries(request).await?,
        };

        info!(path = %url, response_code = response.status(), "Khipu API response");
        debug!(body = %String::from_utf8_lossy(response.body()), "API response body");

        Ok(response)
    }

    /// Send a request and interpret the response.
    ///
    /// # Errors
    ///
    /// Everything [`Self::request_raw`] returns, plus the classified error
    /// for a non-2xx status.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Params,
        options: &RequestOptions,
        base_address: BaseAddress,
    ) -> Result<KhipuResponse> {
        let response = self
            .request_raw(method, path, params, options, base_address)
            .await?;
        interpret_response(response, ApiMode::from_path(path))
    }
}
