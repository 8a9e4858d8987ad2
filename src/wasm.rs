//! Browser bindings for the canvas session.

use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::config::CanvasConfig;
use crate::geometry::{Point, Size};
use crate::logging;
use crate::model::StoredSession;
use crate::session::{CanvasSession, FrameEvents};

#[wasm_bindgen(start)]
pub fn start() {
    let config = CanvasConfig::load_from_local_storage().unwrap_or_default();
    logging::init(config.preferences.log_level);
    log::info!("Orthovision canvas module loaded");
}

/// One canvas, driven by the page's event handlers and animation frames.
#[wasm_bindgen]
pub struct WasmCanvas {
    session: CanvasSession,
    last_frame: FrameEvents,
}

#[wasm_bindgen]
impl WasmCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> WasmCanvas {
        let config = CanvasConfig::load_from_local_storage().unwrap_or_default();
        WasmCanvas {
            session: CanvasSession::new(config, Size::new(width, height)),
            last_frame: FrameEvents::default(),
        }
    }

    /// Mount a session blob given as JSON.
    pub fn mount(&mut self, session_json: &str) -> Result<(), JsValue> {
        let stored =
            StoredSession::from_json(session_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.session.mount_stored(stored);
        Ok(())
    }

    /// Mount the blob the upload page left in `sessionStorage`.
    #[wasm_bindgen(js_name = mountFromSessionStorage)]
    pub fn mount_from_session_storage(&mut self) -> Result<(), JsValue> {
        let stored =
            StoredSession::load_from_session_storage().map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.session.mount_stored(stored);
        Ok(())
    }

    /// Call once per animation frame. Returns true when the view should be redrawn.
    pub fn frame(&mut self) -> bool {
        self.last_frame = self.session.frame(Instant::now());
        self.last_frame.became_ready || self.last_frame.overlay_built
    }

    /// Whether the last frame published new read-out values.
    #[wasm_bindgen(js_name = publishedChanged)]
    pub fn published_changed(&self) -> bool {
        self.last_frame.published
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        self.session.wheel(Point::new(x, y), delta_y, Instant::now());
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, x: f64, y: f64) {
        self.session.drag_start(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, x: f64, y: f64) {
        self.session.drag_move(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self) {
        self.session.drag_end();
    }

    pub fn rotate(&mut self) {
        self.session.rotate();
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    #[wasm_bindgen(js_name = toggleOverlay)]
    pub fn toggle_overlay(&mut self) -> bool {
        self.session.toggle_overlay()
    }

    #[wasm_bindgen(js_name = setConfidenceThreshold)]
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.session.set_confidence_threshold(threshold);
    }

    /// Persist the configuration, including the current threshold, to localStorage.
    #[wasm_bindgen(js_name = saveConfig)]
    pub fn save_config(&self) -> Result<(), JsValue> {
        self.session
            .effective_config()
            .save_to_local_storage()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(Size::new(width, height));
    }

    /// Export the image region as PNG bytes.
    pub fn export(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let snapshot = self
            .session
            .export()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(js_sys::Uint8Array::from(snapshot.png.as_slice()))
    }

    #[wasm_bindgen(js_name = exportFilename)]
    pub fn export_filename(&self) -> String {
        self.session.export_filename()
    }

    /// Straight-alpha RGBA pixels of the current view, for `putImageData`.
    #[wasm_bindgen(js_name = renderRgba)]
    pub fn render_rgba(&self) -> Result<Option<Vec<u8>>, JsValue> {
        let canvas = self
            .session
            .render()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(canvas.map(|c| c.to_rgba8()))
    }

    #[wasm_bindgen(js_name = zoomPercent)]
    pub fn zoom_percent(&self) -> f64 {
        self.session.readout().zoom_percent as f64
    }

    #[wasm_bindgen(js_name = rotationDegrees)]
    pub fn rotation_degrees(&self) -> i32 {
        self.session.readout().rotation_degrees
    }

    #[wasm_bindgen(js_name = panX)]
    pub fn pan_x(&self) -> f64 {
        self.session.readout().pan_offset.x
    }

    #[wasm_bindgen(js_name = panY)]
    pub fn pan_y(&self) -> f64 {
        self.session.readout().pan_offset.y
    }

    #[wasm_bindgen(js_name = filteredDetectionCount)]
    pub fn filtered_detection_count(&self) -> usize {
        self.session.readout().filtered_detection_count
    }

    #[wasm_bindgen(js_name = overlayVisible)]
    pub fn overlay_visible(&self) -> bool {
        self.session.overlay_visible()
    }

    /// CSS cursor for the container.
    pub fn cursor(&self) -> String {
        self.session.cursor().as_css().to_string()
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn readout(&self) -> String {
        self.session.readout().to_string()
    }

    /// Tear down the session; pending timers and loads are dropped.
    pub fn destroy(&mut self) {
        self.session.destroy();
    }

    /// Remove the upload hand-off blob, e.g. when leaving the page.
    #[wasm_bindgen(js_name = clearStoredSession)]
    pub fn clear_stored_session() {
        StoredSession::clear_session_storage();
    }
}
