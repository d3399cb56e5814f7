//! Asynchronous REST client.
//!
//! This module provides:
//! - [`HttpClient`]: the orchestrator issuing GET, POST and download requests
//! - [`ClientConfig`]: prefix, credential, language, proxy and timeouts
//! - [`Deferred`]: the deferred result every operation returns
//! - [`ErrorHooks`]: application-supplied error message extraction
//! - [`ClientError`]: every failure an operation can deliver
//!
//! # Example
//!
//! ```no_run
//! use restclient_core::body::UrlEncodedData;
//! use restclient_core::client::{ClientConfig, HttpClient};
//!
//! let client = HttpClient::new(ClientConfig::new("https://api.example.com/v2"))?;
//!
//! let mut form = UrlEncodedData::new();
//! form.add_value("name", "catalog");
//! client
//!     .post("projects", &form, &[])
//!     .on_result(|doc| println!("created {doc}"), |err| eprintln!("{err}"));
//! # Ok::<(), restclient_core::client::ClientError>(())
//! ```

mod classify;
mod compression;
mod config;
mod constants;
mod deferred;
mod download;
mod error;
mod filename;
mod http_client;
mod request;

pub use classify::{
    ClassifiedError, ErrorClassifier, ErrorHooks, ErrorResponseHook, JsonErrorParser,
    is_json_media_type, reason_phrase,
};
pub use compression::{CompressionStage, GZIP_ENCODING, StreamDecoder, inflate};
pub use config::ClientConfig;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_UI_LANGUAGE, FALLBACK_FILENAME, JSON_MEDIA_TYPE,
    READ_TIMEOUT_SECS,
};
pub use deferred::{Deferred, ResponseOutcome};
pub use download::DownloadedFile;
pub use error::ClientError;
pub use filename::{
    filename_from_url, parse_content_disposition, resolve_filename, sanitize_filename,
};
pub use http_client::HttpClient;
pub use request::{PreparedBody, PreparedRequest, resolve_url};
