//! Requestor configuration and per-call overrides.

use std::fmt;

use derive_more::Display;
use indexmap::IndexMap;

/// Default base URL of the `api` slot.
pub const DEFAULT_API_BASE: &str = "https://payment-api.khipu.com";

/// Named base-address slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum BaseAddress {
    /// Main REST API.
    #[default]
    #[display("api")]
    Api,
}

/// Base URLs for every [`BaseAddress`] slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAddresses {
    /// URL of the [`BaseAddress::Api`] slot.
    pub api: Option<String>,
}

impl Default for BaseAddresses {
    fn default() -> Self {
        Self {
            api: Some(DEFAULT_API_BASE.to_string()),
        }
    }
}

impl BaseAddresses {
    /// No slot configured.
    #[must_use]
    pub const fn empty() -> Self {
        Self { api: None }
    }

    /// URL configured for a slot.
    #[must_use]
    pub fn get(&self, slot: BaseAddress) -> Option<&str> {
        match slot {
            BaseAddress::Api => self.api.as_deref(),
        }
    }

    /// Set the URL of a slot.
    #[must_use]
    pub fn with(mut self, slot: BaseAddress, url: impl Into<String>) -> Self {
        match slot {
            BaseAddress::Api => self.api = Some(url.into()),
        }
        self
    }
}

/// Identifies the application embedding this library in the `User-Agent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: Option<String>,
    /// Application homepage.
    pub url: Option<String>,
}

impl AppInfo {
    /// App info with a name only.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            url: None,
        }
    }

    /// Set the version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Display for AppInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "/{version}")?;
        }
        if let Some(url) = &self.url {
            write!(f, " ({url})")?;
        }
        Ok(())
    }
}

/// Instance-level defaults shared by every call of a requestor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestorOptions {
    /// API key sent in the `x-api-key` header.
    pub api_key: Option<String>,
    /// Base URLs.
    pub base_addresses: BaseAddresses,
    /// Extra headers sent on every call.
    pub headers: IndexMap<String, String>,
    /// Embedding application, appended to the `User-Agent`.
    pub app_info: Option<AppInfo>,
}

impl RequestorOptions {
    /// Options with the default base addresses and no API key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replace all base addresses.
    #[must_use]
    pub fn base_addresses(mut self, base_addresses: BaseAddresses) -> Self {
        self.base_addresses = base_addresses;
        self
    }

    /// Set the URL of one base-address slot.
    #[must_use]
    pub fn base_address(mut self, slot: BaseAddress, url: impl Into<String>) -> Self {
        self.base_addresses = self.base_addresses.with(slot, url);
        self
    }

    /// Add a header sent on every call.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the embedding application info.
    #[must_use]
    pub fn app_info(mut self, app_info: AppInfo) -> Self {
        self.app_info = Some(app_info);
        self
    }

    /// API key, ignoring empty strings.
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Derive the options of a single call.
    ///
    /// Per-call values win: the API key replaces the default one, headers are
    /// overlaid on the instance headers. `self` is left untouched.
    #[must_use]
    pub fn merge(&self, overrides: &RequestOptions) -> Self {
        let mut merged = self.clone();
        if let Some(api_key) = &overrides.api_key {
            merged.api_key = Some(api_key.clone());
        }
        merged.headers.extend(
            overrides
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        merged
    }
}

/// Overrides for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// API key for this call only.
    pub api_key: Option<String>,
    /// Extra headers for this call only.
    pub headers: IndexMap<String, String>,
    /// Sent as the `Idempotency-Key` header.
    pub idempotency_key: Option<String>,
}

impl RequestOptions {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
