use serde::Serialize;
use serde_json::Value;

use super::BodyData;

/// `application/json` body holding a serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonData {
    body: String,
}

impl JsonData {
    /// Serializes `document` (compact form).
    #[must_use]
    pub fn new(document: &Value) -> Self {
        Self {
            body: document.to_string(),
        }
    }

    /// Serializes any `Serialize` value.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, e.g. for maps with non-string keys.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            body: serde_json::to_string(value)?,
        })
    }
}

impl BodyData for JsonData {
    fn content_type(&self) -> String {
        "application/json".to_string()
    }

    fn body(&self) -> Vec<u8> {
        self.body.clone().into_bytes()
    }
}
