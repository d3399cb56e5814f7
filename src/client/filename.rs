//! Filename extraction and sanitization for downloads.
//!
//! The name reported for a download comes from the response's
//! `Content-Disposition: attachment; filename=...` header when present, and
//! from the last path segment of the request URL otherwise.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::constants::FALLBACK_FILENAME;

/// `attachment; ... filename*=charset'lang'encoded` (RFC 5987).
#[allow(clippy::expect_used)]
static EXTENDED_FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*attachment\s*;.*?\bfilename\*\s*=\s*[^']*'[^']*'([^;\s]+)"#)
        .expect("extended filename regex is valid") // Static pattern, safe to panic
});

/// `attachment; ... filename="name"` or `filename=name`.
#[allow(clippy::expect_used)]
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*attachment\s*;.*?\bfilename\s*=\s*(?:"([^"]*)"|([^;\s"]+))"#)
        .expect("filename regex is valid") // Static pattern, safe to panic
});

/// Parses a `Content-Disposition` header value for an attachment filename.
///
/// Matching is case-insensitive. Handles:
/// - `attachment; filename="report.pdf"`
/// - `attachment; filename=report.pdf`
/// - `attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf`
///
/// Returns `None` for `inline` dispositions or when no filename is present.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(captures) = EXTENDED_FILENAME_PATTERN.captures(header)
        && let Some(encoded) = captures.get(1)
        && let Ok(decoded) = urlencoding::decode(encoded.as_str())
        && !decoded.is_empty()
    {
        return Some(decoded.into_owned());
    }

    let captures = FILENAME_PATTERN.captures(header)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Filename taken from the last non-empty URL path segment, percent-decoded.
#[must_use]
pub fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    Some(decoded.into_owned())
}

/// Picks the filename for a download: header first, URL second, then a
/// fixed fallback. The result is always sanitized.
#[must_use]
pub fn resolve_filename(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(parse_content_disposition)
        .or_else(|| filename_from_url(url))
        .map_or_else(|| FALLBACK_FILENAME.to_string(), |name| sanitize_filename(&name))
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces `\ / : " < > | ? *` and control characters with `_`, rewrites
/// `.`/`..`, and maps an empty name to `data`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
