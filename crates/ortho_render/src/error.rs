//! Errors produced while rasterizing or encoding.

use thiserror::Error;

/// Errors that can occur while rendering a draw list.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The requested surface has a zero or overflowing dimension
    #[error("Cannot allocate a {width}x{height} surface")]
    InvalidSurface {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// Bitmap data does not match its declared dimensions
    #[error("Bitmap data size mismatch: expected {expected} bytes, got {actual}")]
    BitmapSize {
        /// Expected byte count (width * height * 4)
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
