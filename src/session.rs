//! The canvas session: one image, its detections and the view around them.
//!
//! Lifecycle: `Uninitialized -> Loading -> Ready -> Destroyed`. Mounting a
//! new descriptor while loading or ready starts over in `Loading`. View and
//! overlay operations act only in `Ready` and are ignored otherwise.

use std::fmt;

use ortho_render::{Bitmap, Canvas, RenderError};
use web_time::Instant;

use crate::config::{CanvasConfig, clamp_threshold};
use crate::constants::{OVERLAY_PAINT_DELAY_FRAMES, PLACEHOLDER_SIZE};
use crate::error::ExportError;
use crate::export::{Snapshot, export_filename, export_region};
use crate::geometry::{Point, Size};
use crate::loader::{ImageLoader, ImageSource, LoadOutcome};
use crate::model::{Detection, DetectionResult, ImageDescriptor, StoredSession};
use crate::scene::{ImageContent, PaintGate, SceneRenderer};
use crate::viewport::{Cursor, ViewportController, ViewportState};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    Destroyed,
}

/// What changed during one [`CanvasSession::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEvents {
    /// The image finished loading and the scene was built
    pub became_ready: bool,
    /// The overlay was built after the paint gate opened
    pub overlay_built: bool,
    /// A debounced viewport value reached the published state
    pub published: bool,
}

/// Values a sidebar shows, taken from the published viewport state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasReadout {
    pub zoom_percent: i64,
    /// Raw accumulated rotation
    pub rotation_degrees: i32,
    pub pan_offset: Point,
    pub filtered_detection_count: usize,
    pub total_detection_count: usize,
    pub overlay_visible: bool,
}

impl CanvasReadout {
    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> i32 {
        self.rotation_degrees.rem_euclid(360)
    }
}

impl fmt::Display for CanvasReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {}% | Rotation: {}° | Pan: ({}, {}) | Detections: {}/{}",
            self.zoom_percent,
            self.rotation_degrees,
            self.pan_offset.x.round() + 0.0,
            self.pan_offset.y.round() + 0.0,
            self.filtered_detection_count,
            self.total_detection_count
        )
    }
}

/// Owns every part of one canvas and exposes the host-facing operations.
#[derive(Debug)]
pub struct CanvasSession {
    config: CanvasConfig,
    state: SessionState,
    descriptor: Option<ImageDescriptor>,
    result: Option<DetectionResult>,
    loader: ImageLoader,
    viewport: ViewportController,
    renderer: SceneRenderer,
    paint_gate: PaintGate,
    confidence_threshold: f32,
}

impl CanvasSession {
    /// Session with the platform's default decoder.
    pub fn new(config: CanvasConfig, container: Size) -> Self {
        Self::with_loader(config, container, ImageLoader::platform_default())
    }

    pub fn with_loader(config: CanvasConfig, container: Size, loader: ImageLoader) -> Self {
        let config = config.sanitized();
        let viewport = ViewportController::new(config.viewport.clone(), container);
        let renderer = SceneRenderer::new(config.overlay.clone(), config.viewport.fit_ratio);
        let confidence_threshold = clamp_threshold(config.preferences.confidence_threshold);
        Self {
            config,
            state: SessionState::Uninitialized,
            descriptor: None,
            result: None,
            loader,
            viewport,
            renderer,
            paint_gate: PaintGate::new(),
            confidence_threshold,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn descriptor(&self) -> Option<&ImageDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn detection_result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn cursor(&self) -> Cursor {
        self.viewport.cursor()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Configuration with the current threshold folded in, ready to persist.
    pub fn effective_config(&self) -> CanvasConfig {
        let mut config = self.config.clone();
        config.preferences.confidence_threshold = self.confidence_threshold;
        config
    }

    /// Start showing `descriptor`. Replaces whatever was mounted before.
    pub fn mount(&mut self, descriptor: ImageDescriptor, result: Option<DetectionResult>) {
        if self.state == SessionState::Destroyed {
            log::warn!("Ignoring mount on a destroyed canvas session");
            return;
        }
        if self.state != SessionState::Uninitialized {
            log::info!("Replacing mounted image with {}", descriptor.name);
            self.teardown_scene();
        }

        self.loader.load(ImageSource::from_url(&descriptor.source_url));
        self.descriptor = Some(descriptor);
        self.result = result;
        self.state = SessionState::Loading;
    }

    /// Mount a parsed session blob.
    pub fn mount_stored(&mut self, stored: StoredSession) {
        self.mount(stored.image, stored.detection_result);
    }

    /// Advance one host frame.
    ///
    /// Picks up a finished load, counts down the overlay paint gate and
    /// publishes due viewport changes.
    pub fn frame(&mut self, now: Instant) -> FrameEvents {
        let mut events = FrameEvents::default();

        if self.state == SessionState::Loading {
            if let Some(event) = self.loader.poll() {
                self.build_scene(event.outcome);
                events.became_ready = true;
                // The host paints the image after this frame
                self.paint_gate.arm(OVERLAY_PAINT_DELAY_FRAMES);
                return events;
            }
        }

        if self.state != SessionState::Ready {
            return events;
        }

        if self.paint_gate.tick() {
            self.rebuild_overlay();
            events.overlay_built = true;
        }
        events.published = self.viewport.poll(now);
        events
    }

    pub fn wheel(&mut self, pointer: Point, delta_y: f64, now: Instant) {
        if self.is_ready() {
            self.viewport.on_wheel(pointer, delta_y, now);
        }
    }

    pub fn drag_start(&mut self, pointer: Point) {
        if self.is_ready() {
            self.viewport.on_drag_start(pointer);
        }
    }

    pub fn drag_move(&mut self, pointer: Point) {
        if self.is_ready() {
            self.viewport.on_drag_move(pointer);
        }
    }

    pub fn drag_end(&mut self) {
        if self.is_ready() {
            self.viewport.on_drag_end();
        }
    }

    /// Rotate the image and its overlay by +90 degrees.
    pub fn rotate(&mut self) {
        if !self.is_ready() || !self.renderer.has_image() {
            return;
        }
        let degrees = self.viewport.rotate();
        self.renderer.set_rotation(f64::from(degrees));
        log::debug!("Rotated to {}°", degrees);
    }

    /// Zoom 1, no pan, no rotation, image centered in the container.
    pub fn reset_view(&mut self) {
        if !self.is_ready() || !self.renderer.has_image() {
            return;
        }
        self.viewport.reset_view();
        self.renderer.recenter(self.viewport.container());
        log::debug!("View reset");
    }

    /// Flip overlay visibility. Returns the new visibility.
    pub fn toggle_overlay(&mut self) -> bool {
        if self.is_ready() {
            let visible = !self.renderer.overlay_visible();
            self.renderer.set_overlay_visible(visible);
        }
        self.renderer.overlay_visible()
    }

    pub fn set_overlay_visible(&mut self, visible: bool) {
        if self.is_ready() {
            self.renderer.set_overlay_visible(visible);
        }
    }

    pub fn overlay_visible(&self) -> bool {
        self.renderer.overlay_visible()
    }

    /// Change the confidence cutoff, rebuilding a built overlay.
    ///
    /// The value is kept in every state so a later overlay uses it.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        let threshold = clamp_threshold(threshold);
        if threshold == self.confidence_threshold {
            return;
        }
        self.confidence_threshold = threshold;
        if self.is_ready() && self.paint_gate.is_released() {
            self.rebuild_overlay();
        }
    }

    /// Resize the drawable surface. View state is unchanged.
    pub fn resize(&mut self, container: Size) {
        if self.state != SessionState::Destroyed {
            self.viewport.resize_container(container);
        }
    }

    /// Detections passing the current threshold.
    pub fn filtered_detections(&self) -> Vec<&Detection> {
        self.result
            .as_ref()
            .map(|r| r.filtered(self.confidence_threshold))
            .unwrap_or_default()
    }

    pub fn readout(&self) -> CanvasReadout {
        let published: &ViewportState = self.viewport.published();
        CanvasReadout {
            zoom_percent: published.zoom_percent(),
            rotation_degrees: published.rotation_degrees,
            pan_offset: published.pan_offset,
            filtered_detection_count: self.filtered_detections().len(),
            total_detection_count: self.result.as_ref().map_or(0, |r| r.detections.len()),
            overlay_visible: self.renderer.overlay_visible(),
        }
    }

    /// Export the image region as PNG.
    pub fn export(&self) -> Result<Snapshot, ExportError> {
        if !self.is_ready() {
            return Err(ExportError::NoImage);
        }
        export_region(&self.renderer, self.config.export.pixel_ratio).inspect_err(|e| {
            log::error!("Export failed: {}", e);
        })
    }

    /// File name for [`CanvasSession::export`].
    pub fn export_filename(&self) -> String {
        export_filename(&self.config.export.product_name, self.result.as_ref())
    }

    /// Rasterize the container as the user sees it. `None` until ready.
    pub fn render(&self) -> Result<Option<Canvas>, RenderError> {
        if !self.is_ready() {
            return Ok(None);
        }
        self.renderer
            .render_viewport(self.viewport.state(), self.viewport.container())
            .map(Some)
    }

    /// Release everything. Nothing is published or built afterwards.
    pub fn destroy(&mut self) {
        if self.state == SessionState::Destroyed {
            return;
        }
        self.teardown_scene();
        self.descriptor = None;
        self.result = None;
        self.state = SessionState::Destroyed;
        log::info!("Canvas session destroyed");
    }

    fn teardown_scene(&mut self) {
        self.loader.cancel();
        self.viewport.cancel_pending();
        self.viewport.reset_view();
        self.paint_gate.reset();
        self.renderer.clear();
    }

    fn build_scene(&mut self, outcome: LoadOutcome) {
        let (content, natural) = match outcome {
            LoadOutcome::Ready(bitmap) => {
                let natural = bitmap_size(&bitmap);
                (ImageContent::Decoded(bitmap), natural)
            }
            LoadOutcome::Failed(e) => {
                log::warn!("Showing placeholder: {}", e);
                (ImageContent::Placeholder, self.placeholder_size())
            }
        };
        self.renderer
            .build_image(content, natural, self.viewport.container());
        self.state = SessionState::Ready;
    }

    fn placeholder_size(&self) -> Size {
        let side = f64::from(PLACEHOLDER_SIZE);
        self.result
            .as_ref()
            .and_then(DetectionResult::original_size)
            .map_or(Size::new(side, side), |(w, h)| {
                Size::new(f64::from(w), f64::from(h))
            })
    }

    fn rebuild_overlay(&mut self) {
        let original = self
            .result
            .as_ref()
            .and_then(DetectionResult::original_size)
            .map(|(w, h)| Size::new(f64::from(w), f64::from(h)));
        let detections = self
            .result
            .as_ref()
            .map(|r| r.filtered(self.confidence_threshold))
            .unwrap_or_default();
        self.renderer.rebuild_overlay(&detections, original);
    }
}

fn bitmap_size(bitmap: &Bitmap) -> Size {
    Size::new(f64::from(bitmap.width()), f64::from(bitmap.height()))
}
