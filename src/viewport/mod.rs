//! Viewport controller: zoom, pan and rotation of a single scene.
//!
//! The controller keeps two copies of [`ViewportState`]. The *live* state
//! drives the renderer and changes on every input event. The *published*
//! state is what external read-outs observe; wheel zoom reaches it only
//! after the debounce window, while drag end, rotate and reset publish at
//! once.

mod debounce;
mod state;

pub use debounce::Debouncer;
pub use state::ViewportState;

use web_time::Instant;

use crate::config::ViewportConfig;
use crate::constants::ROTATION_STEP_DEGREES;
use crate::geometry::{Point, Size};

/// Pointer affordance shown over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Grab,
    Grabbing,
}

impl Cursor {
    /// CSS cursor name.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
        }
    }
}

/// Zoom and pan carried by a debounced wheel publish.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ZoomPan {
    zoom: f64,
    pan: Point,
}

/// Owns the viewport state of one canvas and applies input to it.
#[derive(Debug)]
pub struct ViewportController {
    config: ViewportConfig,
    live: ViewportState,
    published: ViewportState,
    container: Size,
    cursor: Cursor,
    drag_anchor: Option<Point>,
    wheel_publish: Debouncer<ZoomPan>,
}

impl ViewportController {
    pub fn new(config: ViewportConfig, container: Size) -> Self {
        let wheel_publish = Debouncer::new(config.debounce());
        Self {
            config,
            live: ViewportState::default(),
            published: ViewportState::default(),
            container,
            cursor: Cursor::default(),
            drag_anchor: None,
            wheel_publish,
        }
    }

    /// State the renderer draws with.
    pub fn state(&self) -> &ViewportState {
        &self.live
    }

    /// State external observers see.
    pub fn published(&self) -> &ViewportState {
        &self.published
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Zoom toward or away from `pointer` (screen coordinates).
    ///
    /// Negative or zero `delta_y` zooms in. The logical point under the
    /// pointer stays under it.
    pub fn on_wheel(&mut self, pointer: Point, delta_y: f64, now: Instant) {
        let old_zoom = self.live.zoom_scale;
        let point_to = self.live.screen_to_logical(pointer);

        let stepped = if delta_y > 0.0 {
            old_zoom / self.config.zoom_step
        } else {
            old_zoom * self.config.zoom_step
        };
        let new_zoom = stepped.clamp(self.config.zoom_min, self.config.zoom_max);

        self.live.zoom_scale = new_zoom;
        self.live.pan_offset = Point::new(
            pointer.x - point_to.x * new_zoom,
            pointer.y - point_to.y * new_zoom,
        );

        log::debug!(
            "Wheel at ({:.1}, {:.1}): zoom {:.4} -> {:.4}",
            pointer.x,
            pointer.y,
            old_zoom,
            new_zoom
        );

        self.wheel_publish.schedule(
            ZoomPan {
                zoom: new_zoom,
                pan: self.live.pan_offset,
            },
            now,
        );
    }

    pub fn on_drag_start(&mut self, pointer: Point) {
        self.drag_anchor = Some(pointer);
        self.cursor = Cursor::Grabbing;
    }

    /// Pan by the pointer movement since the last drag event.
    pub fn on_drag_move(&mut self, pointer: Point) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        self.live.pan_offset.x += pointer.x - anchor.x;
        self.live.pan_offset.y += pointer.y - anchor.y;
        self.drag_anchor = Some(pointer);
    }

    /// Finish a drag and publish the pan immediately.
    ///
    /// Any wheel publish still waiting is dropped, since the live state it
    /// would have carried is now superseded.
    pub fn on_drag_end(&mut self) {
        if self.drag_anchor.take().is_none() {
            return;
        }
        self.cursor = Cursor::Grab;
        self.wheel_publish.cancel();
        self.publish_zoom_pan();
        log::debug!(
            "Drag end: pan ({:.1}, {:.1})",
            self.live.pan_offset.x,
            self.live.pan_offset.y
        );
    }

    /// Rotate by +90 degrees. Returns the new raw rotation.
    pub fn rotate(&mut self) -> i32 {
        self.live.rotation_degrees += ROTATION_STEP_DEGREES;
        self.published.rotation_degrees = self.live.rotation_degrees;
        self.live.rotation_degrees
    }

    /// Return to zoom 1, no pan, no rotation, in one step.
    pub fn reset_view(&mut self) {
        self.wheel_publish.cancel();
        self.drag_anchor = None;
        self.cursor = Cursor::Grab;
        self.live = ViewportState::default();
        self.published = self.live;
    }

    /// Change the drawable surface size. Zoom, pan and rotation are kept.
    pub fn resize_container(&mut self, container: Size) {
        log::debug!(
            "Container resized {}x{} -> {}x{}",
            self.container.width,
            self.container.height,
            container.width,
            container.height
        );
        self.container = container;
    }

    /// Publish a due wheel change. Returns true when the published state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.wheel_publish.poll(now) {
            Some(zoom_pan) => {
                self.published.zoom_scale = zoom_pan.zoom;
                self.published.pan_offset = zoom_pan.pan;
                true
            }
            None => false,
        }
    }

    /// Drop any pending publish. Called on teardown.
    pub fn cancel_pending(&mut self) -> bool {
        self.wheel_publish.cancel()
    }

    pub fn has_pending_publish(&self) -> bool {
        self.wheel_publish.is_pending()
    }

    fn publish_zoom_pan(&mut self) {
        self.published.zoom_scale = self.live.zoom_scale;
        self.published.pan_offset = self.live.pan_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn controller() -> ViewportController {
        ViewportController::new(ViewportConfig::default(), Size::new(800.0, 600.0))
    }

    #[test]
    fn test_wheel_direction() {
        let mut vp = controller();
        let now = Instant::now();
        vp.on_wheel(Point::ORIGIN, -120.0, now);
        assert!((vp.state().zoom_scale - 1.05).abs() < EPS);
        vp.on_wheel(Point::ORIGIN, 120.0, now);
        assert!((vp.state().zoom_scale - 1.0).abs() < EPS);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = controller();
        let now = Instant::now();
        for _ in 0..200 {
            vp.on_wheel(Point::new(10.0, 10.0), -1.0, now);
            assert!(vp.state().zoom_scale <= 5.0);
        }
        assert_eq!(vp.state().zoom_scale, 5.0);
        for _ in 0..400 {
            vp.on_wheel(Point::new(10.0, 10.0), 1.0, now);
            assert!(vp.state().zoom_scale >= 0.1);
        }
        assert_eq!(vp.state().zoom_scale, 0.1);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut vp = controller();
        let now = Instant::now();
        vp.on_drag_start(Point::new(0.0, 0.0));
        vp.on_drag_move(Point::new(35.0, -12.0));
        vp.on_drag_end();

        let pointer = Point::new(420.0, 310.0);
        let before = vp.state().screen_to_logical(pointer);
        vp.on_wheel(pointer, -3.0, now);
        let after = vp.state().logical_to_screen(before);
        assert!((after.x - pointer.x).abs() < 1e-9);
        assert!((after.y - pointer.y).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_publish_is_debounced() {
        let mut vp = controller();
        let start = Instant::now();
        let mut publishes = 0;
        for i in 0..10 {
            let t = start + Duration::from_millis(i * 10);
            vp.on_wheel(Point::new(100.0, 100.0), -1.0, t);
            if vp.poll(t) {
                publishes += 1;
            }
        }
        assert_eq!(vp.published().zoom_scale, 1.0);

        let last = start + Duration::from_millis(90);
        assert!(!vp.poll(last + Duration::from_millis(149)));
        if vp.poll(last + Duration::from_millis(150)) {
            publishes += 1;
        }
        assert_eq!(publishes, 1);
        assert_eq!(vp.published().zoom_scale, vp.state().zoom_scale);
        assert_eq!(vp.published().pan_offset, vp.state().pan_offset);
    }

    #[test]
    fn test_drag_end_publishes_and_cancels_wheel() {
        let mut vp = controller();
        let now = Instant::now();
        vp.on_wheel(Point::new(50.0, 50.0), -1.0, now);
        assert!(vp.has_pending_publish());

        vp.on_drag_start(Point::new(10.0, 10.0));
        assert_eq!(vp.cursor(), Cursor::Grabbing);
        vp.on_drag_move(Point::new(30.0, 5.0));
        vp.on_drag_end();

        assert_eq!(vp.cursor(), Cursor::Grab);
        assert!(!vp.has_pending_publish());
        assert_eq!(vp.published(), vp.state());
        assert!(!vp.poll(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_drag_move_without_start_is_ignored() {
        let mut vp = controller();
        vp.on_drag_move(Point::new(100.0, 100.0));
        vp.on_drag_end();
        assert_eq!(*vp.state(), ViewportState::default());
    }

    #[test]
    fn test_rotate_accumulates_without_wrap() {
        let mut vp = controller();
        for n in 1..=6 {
            assert_eq!(vp.rotate(), n * 90);
        }
        assert_eq!(vp.published().rotation_degrees, 540);
        assert_eq!(vp.state().normalized_rotation(), 180);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut vp = controller();
        let now = Instant::now();
        vp.rotate();
        vp.on_wheel(Point::new(10.0, 20.0), -1.0, now);
        vp.reset_view();
        let first = *vp.state();
        vp.reset_view();
        assert_eq!(first, *vp.state());
        assert_eq!(first, ViewportState::default());
        assert_eq!(*vp.published(), first);
        assert!(!vp.has_pending_publish());
    }

    #[test]
    fn test_resize_keeps_state() {
        let mut vp = controller();
        vp.rotate();
        let before = *vp.state();
        vp.resize_container(Size::new(1024.0, 768.0));
        assert_eq!(*vp.state(), before);
        assert_eq!(vp.container(), Size::new(1024.0, 768.0));
    }
}
