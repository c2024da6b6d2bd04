//! High level client.

use serde::de::DeserializeOwned;

use crate::{
    ApiRequestor, AppInfo, BaseAddress, HttpClient, HyperClient, KhipuResponse, Method, Params,
    RequestOptions, RequestorOptions, Result,
    resources::{self, BanksResponse},
};

/// Entry point to the Khipu API.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> khipu::Result<()> {
/// use khipu::KhipuClient;
///
/// let client = KhipuClient::new("my-api-key");
/// let banks = client.banks().await?;
/// for bank in &banks.banks {
///     tracing::info!(bank_id = %bank.bank_id, name = %bank.name, "bank");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KhipuClient<C = HyperClient> {
    requestor: ApiRequestor<C>,
}

impl KhipuClient {
    /// Create a client using the default base address and transport.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    /// Create a client builder.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> KhipuClientBuilder {
        KhipuClientBuilder {
            options: RequestorOptions::new().api_key(api_key),
            client: None,
        }
    }
}

impl<C: HttpClient> KhipuClient<C> {
    /// Requestor used by this client.
    #[must_use]
    pub const fn requestor(&self) -> &ApiRequestor<C> {
        &self.requestor
    }

    /// Send an arbitrary request and interpret the response.
    ///
    /// `method` is matched case-insensitively against `get`, `post` and
    /// `delete`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::ApiConnection`] for an unknown method, before any I/O,
    /// - any error of [`ApiRequestor::request`].
    pub async fn raw_request(
        &self,
        method: &str,
        path: &str,
        params: Params,
        options: RequestOptions,
    ) -> Result<KhipuResponse> {
        let method: Method = method.parse()?;
        self.requestor
            .request(method, path, params, &options, BaseAddress::Api)
            .await
    }

    /// Hydrate a response into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::JsonDeserialization`] with the failing path.
    pub fn deserialize<T: DeserializeOwned>(&self, response: &KhipuResponse) -> Result<T> {
        response.json()
    }

    /// List the banks available to pay into this account.
    ///
    /// # Errors
    ///
    /// Any error of [`ApiRequestor::request`], or
    /// [`crate::Error::JsonDeserialization`] for an unexpected body.
    pub async fn banks(&self) -> Result<BanksResponse> {
        resources::banks::list(&self.requestor).await
    }
}

/// Builder for [`KhipuClient`].
#[derive(Debug, Clone)]
pub struct KhipuClientBuilder<C = HyperClient> {
    options: RequestorOptions,
    client: Option<C>,
}

impl<C> KhipuClientBuilder<C> {
    /// Override the API base address.
    #[must_use]
    pub fn base_address(mut self, url: impl Into<String>) -> Self {
        self.options = self.options.base_address(BaseAddress::Api, url);
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.header(name, value);
        self
    }

    /// Identify the calling application in the `User-Agent`.
    #[must_use]
    pub fn app_info(mut self, app_info: AppInfo) -> Self {
        self.options = self.options.app_info(app_info);
        self
    }

    /// Use a specific transport instead of the shared default one.
    #[must_use]
    pub fn http_client<D: HttpClient>(self, client: D) -> KhipuClientBuilder<D> {
        KhipuClientBuilder {
            options: self.options,
            client: Some(client),
        }
    }
}

impl<C: HttpClient> KhipuClientBuilder<C> {
    /// Build the client.
    #[must_use]
    pub fn build(self) -> KhipuClient<C> {
        KhipuClient {
            requestor: ApiRequestor::from_parts(self.options, self.client),
        }
    }
}
