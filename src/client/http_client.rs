//! The request orchestrator.
//!
//! [`HttpClient`] is bound to one URL prefix. Each operation builds an
//! immutable [`PreparedRequest`] on the calling thread, then hands it to the
//! worker runtime, where the response flows through the same stages every
//! time:
//!
//! ```text
//! send (Accept-Encoding: gzip) -> receive -> gunzip -> classify -> parse JSON / stream to file
//! ```
//!
//! The only mutable state is the authorization token, swapped atomically and
//! read once per request build.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use reqwest::{Method, Proxy, StatusCode};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};
use url::{Position, Url};

use super::classify::{ErrorClassifier, reason_phrase};
use super::compression::CompressionStage;
use super::config::ClientConfig;
use super::deferred::{Deferred, ResponseOutcome, worker_handle};
use super::download::{DownloadedFile, destination_path, stream_to_file};
use super::error::ClientError;
use super::filename::resolve_filename;
use super::request::{self, PreparedBody, PreparedRequest, StandardHeaders};
use crate::body::BodyData;
use crate::reachability::{self, FixedProbe, ReachabilityProbe};

/// Asynchronous REST client bound to one URL prefix.
///
/// Cheap to clone; clones share the transport, the authorization token and
/// the worker runtime.
///
/// # Example
///
/// ```no_run
/// use restclient_core::client::{ClientConfig, HttpClient};
///
/// # async fn example() -> Result<(), restclient_core::client::ClientError> {
/// let client = HttpClient::new(ClientConfig::new("https://api.example.com/v2"))?;
/// client.set_authorization("Bearer abc123");
/// let user = client.get("user", &[]).await?;
/// println!("{}", user["name"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: reqwest::Client,
    standard_headers: StandardHeaders,
    authorization: ArcSwapOption<String>,
    classifier: ErrorClassifier,
    compression: CompressionStage,
    probe: Box<dyn ReachabilityProbe>,
    runtime: Handle,
}

impl HttpClient {
    /// Creates a client, selecting the reachability probe for this host.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] for an unusable proxy or TLS setup,
    /// [`ClientError::InvalidHeader`] when the product name or UI language
    /// cannot be sent as a header, and [`ClientError::Runtime`] when no worker
    /// runtime can be started.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let probe = reachability::select_probe(config.default_reachable());
        Self::with_probe(config, probe)
    }

    /// Creates a client with an explicit reachability probe.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::new`].
    pub fn with_probe(
        config: ClientConfig,
        probe: Box<dyn ReachabilityProbe>,
    ) -> Result<Self, ClientError> {
        let transport = build_transport(&config)?;
        let standard_headers = StandardHeaders::new(&config.user_agent(), config.ui_language())?;
        let runtime = worker_handle()?;
        let authorization = ArcSwapOption::from(
            config
                .authorization()
                .filter(|token| !token.is_empty())
                .map(|token| Arc::new(token.to_string())),
        );

        info!(
            url_prefix = %config.url_prefix(),
            probe = probe.name(),
            "HTTP client created"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                classifier: ErrorClassifier::new(config.error_hooks().clone()),
                config,
                transport,
                standard_headers,
                authorization,
                compression: CompressionStage,
                probe,
                runtime,
            }),
        })
    }

    /// Configuration this client was created with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Replaces the `Authorization` value for all subsequent requests. An
    /// empty token removes the header. Requests already built keep the value
    /// they were built with.
    pub fn set_authorization(&self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            self.clear_authorization();
        } else {
            debug!("authorization updated");
            self.inner.authorization.store(Some(Arc::new(token)));
        }
    }

    /// Stops sending an `Authorization` header.
    pub fn clear_authorization(&self) {
        debug!("authorization cleared");
        self.inner.authorization.store(None);
    }

    /// Whether the host currently has outbound connectivity. Reads local
    /// interface state only.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.inner.probe.is_reachable()
    }

    /// Builds the request an operation would send, without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] or [`ClientError::InvalidHeader`]
    /// when the request cannot be constructed.
    pub fn prepare(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<&dyn BodyData>,
    ) -> Result<PreparedRequest, ClientError> {
        let authorization = self.inner.authorization.load_full();
        request::build_request(
            method,
            self.inner.config.url_prefix(),
            path,
            &self.inner.standard_headers,
            authorization.as_deref().map(String::as_str),
            headers,
            body.map(PreparedBody::from_data),
        )
    }

    /// GETs `path` and parses the response as JSON.
    pub fn get(&self, path: &str, headers: &[(&str, &str)]) -> Deferred<Value> {
        self.dispatch_document(Method::GET, path, headers, None)
    }

    /// POSTs `body` to `path` and parses the response as JSON.
    ///
    /// The body is serialized before this returns.
    pub fn post(
        &self,
        path: &str,
        body: &dyn BodyData,
        headers: &[(&str, &str)],
    ) -> Deferred<Value> {
        self.dispatch_document(Method::POST, path, headers, Some(body))
    }

    /// GETs `path` and streams the body to `destination`.
    ///
    /// An existing directory receives the file under its server-provided
    /// name; any other path is used as the file path itself.
    pub fn download(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        destination: impl AsRef<Path>,
    ) -> Deferred<DownloadedFile> {
        let destination = destination.as_ref().to_path_buf();
        match self.prepare(Method::GET, path, headers, None) {
            Ok(request) => {
                let inner = Arc::clone(&self.inner);
                Deferred::spawn(&self.inner.runtime, async move {
                    inner.fetch_to_file(request, destination).await
                })
            }
            Err(error) => Deferred::rejected(&self.inner.runtime, error),
        }
    }

    /// Downloads an absolute `url` through a transient client bound to its
    /// origin, inheriting every other setting from `config`.
    ///
    /// # Errors
    ///
    /// Fails synchronously when `url` has no origin or the transient client
    /// cannot be created; every later failure is delivered by the deferred.
    pub fn download_from_anywhere(
        config: &ClientConfig,
        url: &str,
        headers: &[(&str, &str)],
        destination: impl AsRef<Path>,
    ) -> Result<Deferred<DownloadedFile>, ClientError> {
        let parsed = Url::parse(url).map_err(|_| ClientError::invalid_url(url))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(ClientError::invalid_url(url));
        }
        let client = Self::with_probe(
            config.rebased(origin.ascii_serialization()),
            Box::new(FixedProbe(config.default_reachable())),
        )?;
        // The spawned task holds its own reference, keeping the transient
        // client alive until the download resolves.
        let path = &parsed[Position::BeforePath..Position::AfterQuery];
        Ok(client.download(path, headers, destination))
    }

    /// Fire-and-forget GET; failures are logged at debug level.
    pub fn get_detached(&self, path: &str) {
        let label = path.to_string();
        self.get(path, &[]).on_complete(move |outcome| log_detached(&label, outcome));
    }

    /// Fire-and-forget POST; failures are logged at debug level.
    pub fn post_detached(&self, path: &str, body: &dyn BodyData) {
        let label = path.to_string();
        self.post(path, body, &[])
            .on_complete(move |outcome| log_detached(&label, outcome));
    }

    fn dispatch_document(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<&dyn BodyData>,
    ) -> Deferred<Value> {
        match self.prepare(method, path, headers, body) {
            Ok(request) => {
                let inner = Arc::clone(&self.inner);
                Deferred::spawn(&self.inner.runtime, async move {
                    inner.fetch_document(request).await
                })
            }
            Err(error) => Deferred::rejected(&self.inner.runtime, error),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .field("probe", &self.inner.probe.name())
            .finish_non_exhaustive()
    }
}

impl ClientInner {
    async fn send(&self, request: PreparedRequest) -> Result<reqwest::Response, ClientError> {
        let url = request.url().to_string();
        let mut outgoing = request
            .into_transport(&self.transport)
            .build()
            .map_err(|e| ClientError::transport(&url, e))?;
        self.compression.advertise(outgoing.headers_mut());

        let response = self
            .transport
            .execute(outgoing)
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(response)
    }

    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    async fn fetch_document(&self, request: PreparedRequest) -> ResponseOutcome<Value> {
        let url = request.url().to_string();
        let response = self.send(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let raw = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;

        if !status.is_success() {
            return Err(self.failure(&url, status, &headers, raw));
        }

        let body = self
            .compression
            .decode(&headers, raw)
            .map_err(|e| ClientError::decompress(&url, e))?;
        debug!(bytes = body.len(), "response body received");
        parse_document(&url, &body)
    }

    #[instrument(
        skip(self, request, destination),
        fields(url = %request.url(), destination = %destination.display())
    )]
    async fn fetch_to_file(
        &self,
        request: PreparedRequest,
        destination: PathBuf,
    ) -> ResponseOutcome<DownloadedFile> {
        let url = request.url().clone();
        let response = self.send(request).await?;
        let status = response.status();

        if !status.is_success() {
            let headers = response.headers().clone();
            let raw = response
                .bytes()
                .await
                .map_err(|e| ClientError::transport(url.as_str(), e))?;
            return Err(self.failure(url.as_str(), status, &headers, raw));
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let filename = resolve_filename(content_disposition.as_deref(), &url);
        let file_path = destination_path(&destination, &filename).await;
        let decoder = self.compression.stream_decoder(response.headers());

        debug!(path = %file_path.display(), filename = %filename, "streaming download");
        let bytes_written = stream_to_file(response, decoder, url.as_str(), &file_path).await?;

        info!(
            path = %file_path.display(),
            bytes = bytes_written,
            "download complete"
        );
        Ok(DownloadedFile::new(file_path, filename, bytes_written))
    }

    /// Turns a non-2xx response into [`ClientError::Http`].
    ///
    /// A body that fails to inflate is classified as if it were empty, so the
    /// status still reaches the caller.
    fn failure(
        &self,
        url: &str,
        status: StatusCode,
        headers: &HeaderMap,
        raw: Bytes,
    ) -> ClientError {
        let body = self.compression.decode(headers, raw).unwrap_or_else(|error| {
            debug!(error = %error, "could not inflate error body");
            Bytes::new()
        });
        let (status, message) = match self.classifier.classify(status, headers, &body) {
            Some(classified) => (classified.status, classified.message),
            None => (status.as_u16(), reason_phrase(status.as_u16())),
        };
        warn!(url = %url, status, message = %message, "request failed");
        ClientError::http(url, status, message)
    }
}

fn build_transport(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    // Built without reqwest's decompression features; CompressionStage decodes.
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs()))
        .timeout(Duration::from_secs(config.read_timeout_secs()));
    if let Some(proxy_url) = config.effective_proxy() {
        debug!("routing requests through configured proxy");
        let proxy = Proxy::all(&proxy_url).map_err(|source| ClientError::Build { source })?;
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|source| ClientError::Build { source })
}

/// Parses a successful body. An empty body is JSON `null`.
fn parse_document(url: &str, body: &[u8]) -> ResponseOutcome<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ClientError::decode(url, e))
}

fn log_detached(path: &str, outcome: ResponseOutcome<Value>) {
    if let Err(error) = outcome {
        debug!(path = %path, error = %error, "detached request failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::UrlEncodedData;

    fn client(config: ClientConfig) -> HttpClient {
        HttpClient::with_probe(config, Box::new(FixedProbe(true))).unwrap()
    }

    #[test]
    fn test_parse_document_empty_is_null() {
        assert_eq!(parse_document("u", b"").unwrap(), Value::Null);
        assert_eq!(parse_document("u", b" \n").unwrap(), Value::Null);
        assert_eq!(
            parse_document("u", br#"{"ok":true}"#).unwrap(),
            serde_json::json!({"ok": true})
        );
    }

    #[test]
    fn test_parse_document_invalid_is_decode_error() {
        let error = parse_document("https://x/y", b"<html>").unwrap_err();
        assert!(matches!(error, ClientError::Decode { ref url, .. } if url == "https://x/y"));
    }

    #[tokio::test]
    async fn test_set_authorization_applies_to_later_requests_only() {
        let client = client(ClientConfig::new("https://api.example.com"));
        let before = client.prepare(Method::GET, "me", &[], None).unwrap();
        assert!(before.header("authorization").is_none());

        client.set_authorization("Bearer one");
        let after = client.prepare(Method::GET, "me", &[], None).unwrap();
        assert_eq!(after.header("authorization").unwrap(), "Bearer one");
        // Already-built requests are unaffected.
        assert!(before.header("authorization").is_none());

        client.set_authorization("");
        let cleared = client.prepare(Method::GET, "me", &[], None).unwrap();
        assert!(cleared.header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_initial_authorization_from_config() {
        let client = client(ClientConfig::new("https://api.example.com").with_authorization("T"));
        let request = client.prepare(Method::GET, "", &[], None).unwrap();
        assert_eq!(request.header("authorization").unwrap(), "T");

        let clone = client.clone();
        clone.clear_authorization();
        let request = client.prepare(Method::GET, "", &[], None).unwrap();
        assert!(request.header("authorization").is_none(), "clones share the token");
    }

    #[tokio::test]
    async fn test_prepare_post_carries_body() {
        let client = client(ClientConfig::new("https://api.example.com"));
        let mut form = UrlEncodedData::new();
        form.add_value("a", "b");
        let request = client
            .prepare(Method::POST, "form", &[], Some(&form))
            .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.body().unwrap().bytes().as_ref(), b"a=b");
    }

    #[tokio::test]
    async fn test_invalid_prefix_rejects_through_deferred() {
        let client = client(ClientConfig::new("not a url"));
        let outcome = client.get("x", &[]).await;
        assert!(matches!(outcome, Err(ClientError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_bad_proxy_fails_construction() {
        let config = ClientConfig::new("https://api.example.com").with_proxy("http://bad host:99");
        let result = HttpClient::with_probe(config, Box::new(FixedProbe(true)));
        assert!(matches!(result, Err(ClientError::Build { .. })));
    }

    #[tokio::test]
    async fn test_download_from_anywhere_requires_origin() {
        let config = ClientConfig::new("https://api.example.com");
        let result = HttpClient::download_from_anywhere(&config, "data:text/plain,hi", &[], "/tmp");
        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));
        let result = HttpClient::download_from_anywhere(&config, "relative/path", &[], "/tmp");
        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));
    }

    #[test]
    fn test_is_reachable_delegates_to_probe() {
        let offline = HttpClient::with_probe(
            ClientConfig::new("https://api.example.com"),
            Box::new(FixedProbe(false)),
        )
        .unwrap();
        assert!(!offline.is_reachable());
    }
}
