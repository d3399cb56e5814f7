//! Constants for the client module (timeouts, header values).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large downloads).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// UI language used for `Accept-Language` when none is configured.
pub const DEFAULT_UI_LANGUAGE: &str = "en";

/// Media type every request asks for and the JSON body declares.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Filename used when neither the response nor the URL yields one.
pub const FALLBACK_FILENAME: &str = "data";
