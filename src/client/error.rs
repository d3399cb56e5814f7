//! Error types for the client module.
//!
//! Every failure an operation can produce is captured in [`ClientError`] and
//! delivered as the rejected state of a [`Deferred`](super::Deferred); nothing
//! is thrown across the worker boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors delivered by [`HttpClient`](super::HttpClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection could not be established or was interrupted.
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// The URL being requested.
        url: String,
        /// The underlying transport error, unmodified.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside `200..300`.
    #[error("HTTP {status} requesting {url}: {message}")]
    Http {
        /// The URL being requested.
        url: String,
        /// Final status code, after the error-response hook ran.
        status: u16,
        /// Human-readable message. Never empty.
        message: String,
    },

    /// A successful response whose body is not a valid JSON document.
    #[error("invalid JSON in response from {url}: {source}")]
    Decode {
        /// The URL being requested.
        url: String,
        /// The parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The response declared gzip encoding but the payload did not inflate.
    #[error("failed to decompress gzip response from {url}: {source}")]
    Decompress {
        /// The URL being requested.
        url: String,
        /// The inflate error.
        #[source]
        source: std::io::Error,
    },

    /// Local file system failure while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URL prefix and path did not combine into a valid URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// A caller-supplied header name or value is not valid HTTP.
    #[error("invalid header: {name}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The HTTP transport could not be configured (bad proxy URL, TLS setup).
    #[error("failed to build HTTP transport: {source}")]
    Build {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The background worker runtime could not be started.
    #[error("failed to start worker runtime: {source}")]
    Runtime {
        /// The underlying IO error from the runtime builder.
        #[source]
        source: std::io::Error,
    },

    /// The worker task ended without delivering a result.
    #[error("request worker terminated before delivering a result")]
    WorkerLost,
}

impl ClientError {
    /// Creates a transport error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a JSON decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates a gzip decompression error.
    pub fn decompress(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Decompress {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Status code of an HTTP error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for classified non-2xx responses.
    #[must_use]
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Returns true when the transport gave up waiting.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path the source error does not carry.
