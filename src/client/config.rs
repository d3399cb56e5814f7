//! Client configuration.
//!
//! One [`ClientConfig`] describes one logical remote endpoint: the URL prefix
//! every path is resolved against, the credential, the UI language advertised
//! in `Accept-Language`, proxy and timeout settings, and the error hooks.

use std::fmt;

use super::classify::ErrorHooks;
use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_UI_LANGUAGE, READ_TIMEOUT_SECS};
use crate::user_agent::{self, DEFAULT_PRODUCT, DEFAULT_VERSION};

/// Environment variables consulted for a proxy, in priority order.
const PROXY_ENV_VARS: &[&str] = &["https_proxy", "HTTPS_PROXY", "http_proxy", "HTTP_PROXY"];

/// Configuration for an [`HttpClient`](super::HttpClient).
///
/// # Example
///
/// ```
/// use restclient_core::client::ClientConfig;
///
/// let config = ClientConfig::new("https://api.example.com/v2/")
///     .with_authorization("Bearer abc123")
///     .with_ui_language("de");
/// assert_eq!(config.ui_language(), "de");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    url_prefix: String,
    authorization: Option<String>,
    ui_language: String,
    proxy: Option<String>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    default_reachable: bool,
    product: String,
    product_version: String,
    error_hooks: ErrorHooks,
}

impl ClientConfig {
    /// Creates a configuration bound to `url_prefix` with default settings.
    #[must_use]
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            authorization: None,
            ui_language: DEFAULT_UI_LANGUAGE.to_string(),
            proxy: None,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            default_reachable: true,
            product: DEFAULT_PRODUCT.to_string(),
            product_version: DEFAULT_VERSION.to_string(),
            error_hooks: ErrorHooks::default(),
        }
    }

    /// Sets the initial `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Sets the UI language tag sent as `Accept-Language`.
    #[must_use]
    pub fn with_ui_language(mut self, tag: impl Into<String>) -> Self {
        self.ui_language = tag.into();
        self
    }

    /// Routes all traffic through an explicit proxy URL.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Overrides connect and total read timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self.read_timeout_secs = read_timeout_secs;
        self
    }

    /// Answer given by the reachability probe when the host offers no usable
    /// connectivity API.
    #[must_use]
    pub fn with_default_reachable(mut self, reachable: bool) -> Self {
        self.default_reachable = reachable;
        self
    }

    /// Sets the product name and version used in the User-Agent.
    #[must_use]
    pub fn with_product(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.product = name.into();
        self.product_version = version.into();
        self
    }

    /// Installs the error classification hooks.
    #[must_use]
    pub fn with_error_hooks(mut self, hooks: ErrorHooks) -> Self {
        self.error_hooks = hooks;
        self
    }

    /// Copy of this configuration bound to a different prefix.
    #[must_use]
    pub fn rebased(&self, url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            ..self.clone()
        }
    }

    /// URL prefix all request paths are appended to.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Initial `Authorization` value, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// UI language tag sent as `Accept-Language`.
    #[must_use]
    pub fn ui_language(&self) -> &str {
        &self.ui_language
    }

    /// Connect timeout in seconds.
    #[must_use]
    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
    }

    /// Total request timeout in seconds.
    #[must_use]
    pub fn read_timeout_secs(&self) -> u64 {
        self.read_timeout_secs
    }

    /// Reachability answer used when no platform API is usable.
    #[must_use]
    pub fn default_reachable(&self) -> bool {
        self.default_reachable
    }

    /// Error classification hooks.
    #[must_use]
    pub fn error_hooks(&self) -> &ErrorHooks {
        &self.error_hooks
    }

    /// Full User-Agent string for this configuration.
    #[must_use]
    pub fn user_agent(&self) -> String {
        user_agent::user_agent(&self.product, &self.product_version)
    }

    /// Proxy to configure explicitly: the configured one, else the first of
    /// `https_proxy`/`http_proxy` from the environment. `None` leaves proxy
    /// discovery to the transport.
    #[must_use]
    pub fn effective_proxy(&self) -> Option<String> {
        self.proxy
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| proxy_from_lookup(|name| std::env::var(name).ok()))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url_prefix", &self.url_prefix)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .field("ui_language", &self.ui_language)
            .field("proxy", &self.proxy)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("default_reachable", &self.default_reachable)
            .field("product", &self.product)
            .field("product_version", &self.product_version)
            .field("error_hooks", &self.error_hooks)
            .finish()
    }
}

fn proxy_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    PROXY_ENV_VARS.iter().find_map(|name| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
