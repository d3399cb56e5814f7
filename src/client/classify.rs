//! Classification of non-2xx responses into a `(status, message)` pair.
//!
//! Different services wrap their error details in different JSON shapes, so
//! the pipeline takes two injectable hooks instead of hard-coding any shape:
//!
//! 1. a JSON error parser that pulls a provider-specific message out of a
//!    JSON error body, and
//! 2. an error-response hook that may rewrite the final status code or message
//!    (for example to flag an expired credential).
//!
//! # Example
//!
//! ```
//! use restclient_core::client::{ErrorClassifier, ErrorHooks};
//!
//! let hooks = ErrorHooks::new().with_json_error_parser(|doc| {
//!     doc.get("error")?.get("message")?.as_str().map(str::to_owned)
//! });
//! let classifier = ErrorClassifier::new(hooks);
//! let error = classifier
//!     .classify_parts(422, Some("application/json"), br#"{"error":{"message":"bad slug"}}"#)
//!     .unwrap();
//! assert_eq!(error.message, "bad slug");
//! ```

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use tracing::debug;

use super::constants::JSON_MEDIA_TYPE;

/// Extracts a provider-specific message from a JSON error body.
pub type JsonErrorParser = dyn Fn(&Value) -> Option<String> + Send + Sync;

/// Rewrites the status code and/or message before the failure is raised.
pub type ErrorResponseHook = dyn Fn(&mut u16, &mut String) + Send + Sync;

/// The two overridable steps of error classification.
///
/// Both default to no-ops.
#[derive(Clone, Default)]
pub struct ErrorHooks {
    parse_json_error: Option<Arc<JsonErrorParser>>,
    on_error_response: Option<Arc<ErrorResponseHook>>,
}

impl ErrorHooks {
    /// Creates hooks that do nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the JSON error-body parser.
    #[must_use]
    pub fn with_json_error_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.parse_json_error = Some(Arc::new(parser));
        self
    }

    /// Sets the hook that may rewrite `(status, message)`.
    #[must_use]
    pub fn with_error_response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut u16, &mut String) + Send + Sync + 'static,
    {
        self.on_error_response = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ErrorHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHooks")
            .field("parse_json_error", &self.parse_json_error.is_some())
            .field("on_error_response", &self.on_error_response.is_some())
            .finish()
    }
}

/// Outcome of classifying a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Final status code.
    pub status: u16,
    /// Human-readable message, never empty.
    pub message: String,
}

/// Turns error responses into [`ClassifiedError`]s.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    hooks: ErrorHooks,
}

impl ErrorClassifier {
    /// Creates a classifier using the given hooks.
    #[must_use]
    pub fn new(hooks: ErrorHooks) -> Self {
        Self { hooks }
    }

    /// Classifies a response given its status, headers and (decoded) body.
    ///
    /// Returns `None` for a status in `200..300`.
    #[must_use]
    pub fn classify(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Option<ClassifiedError> {
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        self.classify_parts(status.as_u16(), content_type, body)
    }

    /// Classifies a response given its raw parts.
    ///
    /// Returns `None` for a status in `200..300`.
    #[must_use]
    pub fn classify_parts(
        &self,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Option<ClassifiedError> {
        if (200..300).contains(&status) {
            return None;
        }

        let mut message = content_type
            .filter(|ct| is_json_media_type(ct))
            .and_then(|_| self.message_from_json(body))
            .unwrap_or_default();
        if message.is_empty() {
            message = reason_phrase(status);
        }

        let mut status = status;
        if let Some(hook) = &self.hooks.on_error_response {
            hook(&mut status, &mut message);
        }
        // The hook may have cleared the message; failures always carry one.
        if message.trim().is_empty() {
            message = reason_phrase(status);
        }

        Some(ClassifiedError { status, message })
    }

    fn message_from_json(&self, body: &[u8]) -> Option<String> {
        let parser = self.hooks.parse_json_error.as_ref()?;
        match serde_json::from_slice::<Value>(body) {
            Ok(document) => parser(&document).filter(|m| !m.trim().is_empty()),
            Err(error) => {
                // A broken error body must not hide the HTTP error itself.
                debug!(error = %error, "ignoring unparsable JSON error body");
                None
            }
        }
    }
}

/// Returns true when `content_type` names `application/json`, ignoring
/// parameters and case.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Standard reason phrase for `status`, or `HTTP <status>` when there is none.
#[must_use]
pub fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), str::to_owned)
}
