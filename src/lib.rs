//! Restclient Core Library
//!
//! An asynchronous REST client for JSON web APIs: authenticated requests,
//! transparent gzip handling, streamed downloads, uniform error
//! classification, and a non-blocking network reachability check.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`client`] - Request orchestration, deferred results, error classification
//! - [`body`] - Request body encoders (form, multipart, JSON)
//! - [`reachability`] - Host connectivity probes

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod client;
pub mod reachability;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use body::{BodyData, EncodeFlags, JsonData, MultipartFormData, UrlEncodedData, url_encode};
pub use client::{
    ClientConfig, ClientError, Deferred, DownloadedFile, ErrorHooks, HttpClient, ResponseOutcome,
};
pub use reachability::{ReachabilityProbe, select_probe};
