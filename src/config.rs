//! Configuration file support for the canvas.
//!
//! Settings are serialized as versioned JSON. Every field has a default, so
//! older or partial files load; values outside their valid range are
//! corrected by [`CanvasConfig::sanitized`].

use std::time::Duration;

use ortho_render::Color;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Convert to log crate's Level.
    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Zoom, pan and fit behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Multiplicative zoom change per wheel notch
    pub zoom_step: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Quiet period before wheel changes reach external read-outs
    pub debounce_ms: u64,
    /// Fraction of the container the fitted image may fill
    pub fit_ratio: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_step: constants::ZOOM_STEP,
            zoom_min: constants::ZOOM_MIN,
            zoom_max: constants::ZOOM_MAX,
            debounce_ms: constants::DEBOUNCE_MS,
            fit_ratio: constants::FIT_RATIO,
        }
    }
}

impl ViewportConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Detection overlay styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Box and label color as `#rrggbb`
    pub stroke_color: String,
    pub stroke_width: f64,
    pub font_size: f64,
    pub font_family: String,
    /// Gap between a label and its box
    pub label_gap: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_color: constants::overlay::STROKE_COLOR.to_string(),
            stroke_width: constants::overlay::STROKE_WIDTH,
            font_size: constants::overlay::FONT_SIZE,
            font_family: constants::overlay::FONT_FAMILY.to_string(),
            label_gap: constants::overlay::LABEL_GAP,
        }
    }
}

impl OverlayStyle {
    /// Parsed stroke color, falling back to the default green.
    pub fn color(&self) -> Color {
        Color::from_hex(&self.stroke_color).unwrap_or(Color::GREEN)
    }
}

/// Snapshot export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output pixels per logical pixel
    pub pixel_ratio: f64,
    /// Filename prefix
    pub product_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: constants::EXPORT_PIXEL_RATIO,
            product_name: constants::PRODUCT_NAME.to_string(),
        }
    }
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserPreferences {
    /// Initial confidence threshold for showing detections
    pub confidence_threshold: f32,
    /// Log verbosity level
    pub log_level: LogLevel,
}

/// Canvas configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Version of the configuration file format
    pub version: u32,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub overlay: OverlayStyle,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub preferences: UserPreferences,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            viewport: ViewportConfig::default(),
            overlay: OverlayStyle::default(),
            export: ExportConfig::default(),
            preferences: UserPreferences::default(),
        }
    }

    /// Correct values that would break the canvas, logging each fix.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::new();

        let vp = &mut self.viewport;
        if !(vp.zoom_min > 0.0 && vp.zoom_min.is_finite()) {
            log::warn!("Invalid zoom_min {}, using default", vp.zoom_min);
            vp.zoom_min = defaults.viewport.zoom_min;
        }
        if !(vp.zoom_max >= vp.zoom_min && vp.zoom_max.is_finite()) {
            log::warn!("Invalid zoom_max {}, using default", vp.zoom_max);
            vp.zoom_max = defaults.viewport.zoom_max.max(vp.zoom_min);
        }
        if !(vp.zoom_step > 1.0 && vp.zoom_step.is_finite()) {
            log::warn!("Invalid zoom_step {}, using default", vp.zoom_step);
            vp.zoom_step = defaults.viewport.zoom_step;
        }
        if !(vp.fit_ratio > 0.0 && vp.fit_ratio <= 1.0) {
            log::warn!("Invalid fit_ratio {}, using default", vp.fit_ratio);
            vp.fit_ratio = defaults.viewport.fit_ratio;
        }

        if !(self.export.pixel_ratio > 0.0 && self.export.pixel_ratio.is_finite()) {
            log::warn!("Invalid pixel_ratio {}, using default", self.export.pixel_ratio);
            self.export.pixel_ratio = defaults.export.pixel_ratio;
        }
        if Color::from_hex(&self.overlay.stroke_color).is_none() {
            log::warn!("Invalid stroke_color '{}', using default", self.overlay.stroke_color);
            self.overlay.stroke_color = defaults.overlay.stroke_color;
        }

        self.preferences.confidence_threshold = clamp_threshold(self.preferences.confidence_threshold);
        self
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config.sanitized())
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "orthovision-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("orthovision").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("orthovision")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "orthovision-config";

    /// Try to load configuration from localStorage (WASM only).
    /// Returns None if not found or can't be parsed.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))?;

        let json = self.to_json()?;

        storage
            .set_item(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| {
                ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e))
            })?;

        log::info!("Saved configuration to localStorage");
        Ok(())
    }
}

/// Clamp a confidence threshold into `[0, 1]`; NaN becomes 0.
pub fn clamp_threshold(threshold: f32) -> f32 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}
