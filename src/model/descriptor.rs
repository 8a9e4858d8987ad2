use serde::{Deserialize, Serialize};

use super::lenient;

/// Number of characters shown before a long file name is abbreviated.
const DISPLAY_NAME_CHARS: usize = 12;

/// The uploaded (or sample) image as described by the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Original file name
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    /// File size in bytes
    #[serde(rename = "size", default, deserialize_with = "lenient")]
    pub byte_size: u64,
    /// MIME type, e.g. `image/png`
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub mime_type: String,
    /// A `data:` URL or a path
    #[serde(rename = "url")]
    pub source_url: String,
}

impl ImageDescriptor {
    /// Create a descriptor for `source_url` with empty metadata.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            byte_size: 0,
            mime_type: String::new(),
            source_url: source_url.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, byte_size: u64) -> Self {
        self.byte_size = byte_size;
        self
    }

    /// Whether the source is an inline `data:` URL.
    pub fn is_data_url(&self) -> bool {
        self.source_url.starts_with("data:")
    }

    /// File name shortened for narrow read-outs.
    pub fn display_name(&self) -> String {
        if self.name.chars().count() > DISPLAY_NAME_CHARS {
            let head: String = self.name.chars().take(DISPLAY_NAME_CHARS).collect();
            format!("{}...", head)
        } else {
            self.name.clone()
        }
    }

    /// File size in megabytes with two decimals.
    pub fn size_megabytes(&self) -> String {
        format!("{:.2}", self.byte_size as f64 / 1024.0 / 1024.0)
    }
}
