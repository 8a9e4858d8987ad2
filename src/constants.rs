//! Global constants for the Orthovision canvas

/// Fraction of the container the fitted image may occupy on each axis
pub const FIT_RATIO: f64 = 0.8;

/// Multiplicative zoom change per wheel notch
pub const ZOOM_STEP: f64 = 1.05;

/// Smallest allowed viewport zoom
pub const ZOOM_MIN: f64 = 0.1;

/// Largest allowed viewport zoom
pub const ZOOM_MAX: f64 = 5.0;

/// Quiet period before wheel-driven view changes are published externally
pub const DEBOUNCE_MS: u64 = 150;

/// Rotation increment applied by a single rotate operation
pub const ROTATION_STEP_DEGREES: i32 = 90;

/// Pixel density multiplier for exported snapshots
pub const EXPORT_PIXEL_RATIO: f64 = 2.0;

/// Frames to wait after the image layer's first paint before building the overlay
pub const OVERLAY_PAINT_DELAY_FRAMES: u8 = 2;

/// Product name used as the export filename prefix
pub const PRODUCT_NAME: &str = "Orthovision";

/// Session storage key holding the uploaded image and its detection result
pub const SESSION_STORAGE_KEY: &str = "uploadedImage";

/// Side length of the placeholder shown when an image fails to decode
/// and the detection result carries no dimensions
pub const PLACEHOLDER_SIZE: u32 = 512;

/// Overlay styling defaults
pub mod overlay {
    /// Detection box and label color
    pub const STROKE_COLOR: &str = "#00ff00";
    /// Detection box outline width in display pixels
    pub const STROKE_WIDTH: f64 = 2.0;
    /// Label font size in display pixels
    pub const FONT_SIZE: f64 = 14.0;
    /// Label font family
    pub const FONT_FAMILY: &str = "DejaVu Sans, sans-serif";
    /// Vertical gap between a label and the top edge of its box
    pub const LABEL_GAP: f64 = 4.0;
}

/// Placeholder styling for failed loads
pub mod placeholder {
    /// Fill color (RGBA8)
    pub const FILL: [u8; 4] = [200, 200, 200, 255];
    /// Outline color (RGB8)
    pub const OUTLINE: [u8; 3] = [120, 120, 120];
}
