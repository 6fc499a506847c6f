//! Form Parts
//!
//! The values a multipart/form-data body is built from.

use bytes::Bytes;
use std::path::PathBuf;

/// Where a binary part's payload comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    /// Payload already held in memory.
    InMemory(Bytes),
    /// Payload read from a file when the body is encoded.
    Path(PathBuf),
}

impl From<Bytes> for FileSource {
    fn from(bytes: Bytes) -> Self {
        Self::InMemory(bytes)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::InMemory(Bytes::from(bytes))
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// A single multipart/form-data part.
///
/// Content types are passed through as given. A payload must not contain the
/// boundary it is encoded with; nothing checks for that.
///
/// Names and file names are written into `Content-Disposition` unescaped, so
/// they must not contain `"`, CR or LF.
#[derive(Clone, Debug)]
pub enum FormPart {
    /// Plain text field.
    Text { name: String, value: String },
    /// JSON document.
    Json {
        name: String,
        payload: serde_json::Value,
    },
    /// File upload, typically an image.
    Image {
        name: String,
        file_name: String,
        content_type: String,
        source: FileSource,
    },
    /// Arbitrary binary value with a caller-chosen content type.
    Other {
        name: String,
        value: Bytes,
        content_type: String,
    },
}

impl FormPart {
    /// Create a text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "form part name must not be empty");
        Self::Text {
            name,
            value: value.into(),
        }
    }

    /// Create a JSON part.
    pub fn json(name: impl Into<String>, payload: serde_json::Value) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "form part name must not be empty");
        Self::Json { name, payload }
    }

    /// Create a file part.
    pub fn image(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        source: impl Into<FileSource>,
    ) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "form part name must not be empty");
        Self::Image {
            name,
            file_name: file_name.into(),
            content_type: content_type.into(),
            source: source.into(),
        }
    }

    /// Create a binary part without a file name.
    pub fn other(
        name: impl Into<String>,
        value: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "form part name must not be empty");
        Self::Other {
            name,
            value: value.into(),
            content_type: content_type.into(),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. }
            | Self::Json { name, .. }
            | Self::Image { name, .. }
            | Self::Other { name, .. } => name,
        }
    }

    /// Content type written in the part header. Text parts have none.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Json { .. } => Some("application/json"),
            Self::Image { content_type, .. } | Self::Other { content_type, .. } => {
                Some(content_type)
            }
        }
    }

    /// File name written in the Content-Disposition header.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Image { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// Header block for this part, from the boundary line to the blank line.
    pub(crate) fn preamble(&self, boundary: &str) -> String {
        let mut head = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"",
            boundary,
            self.name()
        );
        if let Some(file_name) = self.file_name() {
            head.push_str(&format!("; filename=\"{}\"", file_name));
        }
        head.push_str("\r\n");
        if let Some(content_type) = self.content_type() {
            head.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        head.push_str("\r\n");
        head
    }
}
