//! Orthovision - X-ray fracture detection viewer
//!
//! The interactive canvas behind the result page: an image with its
//! detection boxes inside a pannable, zoomable, rotatable viewport, and a
//! cropped high-resolution export of the image region.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod geometry;
pub mod loader;
pub mod logging;
pub mod model;
pub mod scene;
pub mod session;
pub mod viewport;

#[cfg(test)]
mod tests;

pub use config::{CanvasConfig, LogLevel};
pub use error::{ExportError, LoadError, SessionError};
pub use geometry::{Point, Size};
pub use model::{Classification, Detection, DetectionResult, ImageDescriptor, StoredSession};
pub use session::{CanvasReadout, CanvasSession, SessionState};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
