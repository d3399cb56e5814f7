use uuid::Uuid;

use super::BodyData;

/// `multipart/form-data` body (RFC 7578) with plain values and file parts.
///
/// File contents are embedded as raw bytes, without any transfer encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFormData {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartFormData {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartFormData {
    /// Creates an empty form with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(Uuid::new_v4().to_string())
    }

    /// Creates an empty form with a caller-chosen boundary.
    ///
    /// The boundary must not occur inside any part.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    /// The boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Adds a form value.
    pub fn add_value(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
        ));
        self.push(value);
        self.push("\r\n");
        self
    }

    /// Adds a file upload part.
    pub fn add_file(&mut self, name: &str, filename: &str, content: &[u8]) -> &mut Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
        ));
        self.push("Content-Type: application/octet-stream\r\n");
        self.push("Content-Transfer-Encoding: binary\r\n");
        self.push("\r\n");
        self.body.extend_from_slice(content);
        self.push("\r\n");
        self
    }

    fn open_part(&mut self) {
        let delimiter = format!("--{}\r\n", self.boundary);
        self.push(&delimiter);
    }

    fn push(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }
}

impl BodyData for MultipartFormData {
    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn body(&self) -> Vec<u8> {
        let terminator = format!("--{}--\r\n\r\n", self.boundary);
        let mut body = Vec::with_capacity(self.body.len() + terminator.len());
        body.extend_from_slice(&self.body);
        body.extend_from_slice(terminator.as_bytes());
        body
    }
}
