//! Error types for loading, exporting and restoring canvas sessions.

use thiserror::Error;

/// Errors that can occur while fetching or decoding an image source.
///
/// These never escape the loader as hard failures: a failed load still
/// makes the session ready, with a placeholder in place of the image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The `data:` URL is malformed or its payload is not valid base64
    #[error("Invalid data URL: {message}")]
    InvalidDataUrl {
        /// Description of the problem
        message: String,
    },

    /// The image bytes could not be decoded
    #[error("Failed to decode image: {message}")]
    Decode {
        /// Decoder error message
        message: String,
    },

    /// Reading the image from a path or URL failed
    #[error("Failed to read image source '{source_url}': {message}")]
    Fetch {
        /// The source that could not be read
        source_url: String,
        /// Underlying I/O or network error message
        message: String,
    },

    /// The decoder backend went away before answering
    #[error("Decoder unavailable: {0}")]
    BackendClosed(String),
}

impl LoadError {
    /// Create an invalid data URL error.
    pub fn invalid_data_url(message: impl Into<String>) -> Self {
        Self::InvalidDataUrl {
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a fetch error for `source_url`.
    pub fn fetch(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_url: source_url.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced to the host when an export cannot be produced.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No image node exists yet (session not ready or already destroyed)
    #[error("No image available to export")]
    NoImage,

    /// The image node occupies no pixels
    #[error("Export region is empty ({width}x{height})")]
    EmptyRegion {
        /// Region width in output pixels
        width: f64,
        /// Region height in output pixels
        height: f64,
    },

    /// Rasterization or PNG encoding failed
    #[error("Rendering failed: {0}")]
    Render(#[from] ortho_render::RenderError),
}

/// Errors that can occur when restoring a stored session blob.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The blob is not valid JSON or lacks the image descriptor
    #[error("Stored session is unreadable: {0}")]
    Parse(#[from] serde_json::Error),

    /// No session blob is stored
    #[error("No image available")]
    Missing,
}
