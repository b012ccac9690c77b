//! Attached task photos.
//!
//! An [`Image`] holds base64 data without any `data:` URI prefix plus its MIME type.
//! The data URI form (`photo`) is derived from it on demand.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::constants::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};
use crate::models::ValidationError;

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Base64 payload, no data URI prefix
    pub data: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl Image {
    /// Build an image, stripping a `data:...;base64,` prefix from `data` if present.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
        .normalized()
    }

    /// Encode raw bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Parse a legacy `data:<mime>;base64,<payload>` string.
    ///
    /// # Errors
    /// Returns `UnsupportedImageType` if the string is not a base64 data URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ValidationError> {
        let rest = uri
            .trim()
            .strip_prefix(DATA_URI_SCHEME)
            .ok_or_else(|| ValidationError::UnsupportedImageType("not a data URI".to_string()))?;
        let (mime_type, data) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| ValidationError::UnsupportedImageType("data URI is not base64".to_string()))?;
        Ok(Self {
            data: data.to_string(),
            mime_type: mime_type.to_ascii_lowercase(),
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!("{DATA_URI_SCHEME}{}{BASE64_MARKER}{}", self.mime_type, self.data)
    }

    /// Strip a data URI prefix that ended up in the payload and lowercase the MIME type.
    pub fn normalized(mut self) -> Self {
        if let Some(stripped) = strip_data_uri_prefix(&self.data) {
            self.data = stripped.to_string();
        }
        self.mime_type = self.mime_type.trim().to_ascii_lowercase();
        self
    }

    /// Size of the decoded payload in bytes.
    ///
    /// # Errors
    /// Returns `InvalidImageEncoding` if `data` is not valid base64.
    pub fn decoded_len(&self) -> Result<usize, ValidationError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map(|bytes| bytes.len())
            .map_err(|e| ValidationError::InvalidImageEncoding(e.to_string()))
    }

    /// Enforce the MIME whitelist and the size ceiling.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_supported_type(&self.mime_type) {
            return Err(ValidationError::UnsupportedImageType(self.mime_type.clone()));
        }
        let size = self.decoded_len()?;
        if size > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge {
                size,
                max: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }
}

pub fn is_supported_type(mime_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime_type.trim().to_ascii_lowercase().as_str())
}

/// Return the payload after a `data:image/...;base64,` prefix, or `None` if there is none.
pub fn strip_data_uri_prefix(data: &str) -> Option<&str> {
    let rest = data.strip_prefix(DATA_URI_SCHEME)?;
    if !rest.starts_with("image/") {
        return None;
    }
    rest.split_once(BASE64_MARKER).map(|(_, payload)| payload)
}

/// Guess an image MIME type from a file extension.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
