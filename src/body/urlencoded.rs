use super::{BodyData, EncodeFlags, url_encode};

/// `application/x-www-form-urlencoded` form data.
///
/// ```
/// use restclient_core::body::{BodyData, UrlEncodedData};
///
/// let mut form = UrlEncodedData::new();
/// form.add_value("grant_type", "password");
/// form.add_value("user name", "a&b");
/// assert_eq!(form.body(), b"grant_type=password&user+name=a%26b");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlEncodedData {
    body: String,
}

impl UrlEncodedData {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `name=value` pair, percent-encoding both parts.
    pub fn add_value(&mut self, name: &str, value: &str) -> &mut Self {
        if !self.body.is_empty() {
            self.body.push('&');
        }
        self.body.push_str(&url_encode(name, EncodeFlags::default()));
        self.body.push('=');
        self.body.push_str(&url_encode(value, EncodeFlags::default()));
        self
    }

    /// Returns true when no pair was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl BodyData for UrlEncodedData {
    fn content_type(&self) -> String {
        "application/x-www-form-urlencoded".to_string()
    }

    fn body(&self) -> Vec<u8> {
        self.body.clone().into_bytes()
    }
}
