//! Request body encoders.
//!
//! A [`BodyData`] produces the `Content-Type` and the serialized payload of a
//! POST body. Three encoders are provided:
//!
//! - [`UrlEncodedData`] - `application/x-www-form-urlencoded`
//! - [`MultipartFormData`] - `multipart/form-data` with values and files
//! - [`JsonData`] - `application/json`
//!
//! `body()` is pure: calling it repeatedly on an unchanged encoder yields the
//! same bytes, so a body can be logged or re-sent without side effects.

mod json;
mod multipart;
mod urlencoded;

pub use json::JsonData;
pub use multipart::MultipartFormData;
pub use urlencoded::UrlEncodedData;

/// Encoded request body data.
pub trait BodyData {
    /// `Content-Type` header to send with the body.
    fn content_type(&self) -> String;

    /// The serialized body. Must return identical bytes on every call.
    fn body(&self) -> Vec<u8>;
}

/// Options for [`url_encode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeFlags {
    no_plus: bool,
    keep_slash: bool,
}

impl EncodeFlags {
    /// Encode space as `%20` instead of `+`.
    #[must_use]
    pub fn no_plus(mut self) -> Self {
        self.no_plus = true;
        self
    }

    /// Leave `/` unescaped (for path segments).
    #[must_use]
    pub fn keep_slash(mut self) -> Self {
        self.keep_slash = true;
        self
    }
}

/// Percent-encodes `s` as UTF-8.
///
/// `A-Z a-z 0-9 - _ . ~` pass through; space becomes `+` unless
/// [`EncodeFlags::no_plus`] is set; `/` is kept with
/// [`EncodeFlags::keep_slash`]; every other byte becomes `%XX`.
///
/// ```
/// use restclient_core::body::{EncodeFlags, url_encode};
///
/// assert_eq!(url_encode("a b/c", EncodeFlags::default()), "a+b%2Fc");
/// assert_eq!(url_encode("a b/c", EncodeFlags::default().no_plus().keep_slash()), "a%20b/c");
/// ```
#[must_use]
pub fn url_encode(s: &str, flags: EncodeFlags) -> String {
    let mut encoded = urlencoding::encode(s).into_owned();
    if !flags.no_plus {
        encoded = encoded.replace("%20", "+");
    }
    if flags.keep_slash {
        encoded = encoded.replace("%2F", "/");
    }
    encoded
}
