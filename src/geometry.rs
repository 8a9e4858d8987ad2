//! Pure geometry: fitting, coordinate mapping and node transforms.
//!
//! Three coordinate spaces are involved:
//! - **original**: pixels of the image the detector saw
//! - **display**: the fitted image size inside the container
//! - **logical**: layer coordinates, where nodes are positioned; the
//!   viewport (zoom/pan) maps logical to screen pixels

pub use ortho_render::{Affine, Rect};

use crate::constants::FIT_RATIO;

/// A point or offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Fit an image into a container, preserving aspect ratio.
///
/// The image may occupy at most `FIT_RATIO` of the container on each axis.
/// Whether width or height binds is decided by comparing the image aspect
/// ratio with the container's.
pub fn fit_to_container(natural_w: f64, natural_h: f64, max_w: f64, max_h: f64) -> Size {
    fit_to_container_with_ratio(natural_w, natural_h, max_w, max_h, FIT_RATIO)
}

/// [`fit_to_container`] with an explicit fill ratio.
pub fn fit_to_container_with_ratio(
    natural_w: f64,
    natural_h: f64,
    max_w: f64,
    max_h: f64,
    ratio: f64,
) -> Size {
    let bound_w = max_w * ratio;
    let bound_h = max_h * ratio;
    let image_aspect = natural_w / natural_h;
    let container_aspect = bound_w / bound_h;

    if image_aspect > container_aspect {
        // Width-bound
        Size::new(bound_w, bound_w / image_aspect)
    } else {
        // Height-bound
        Size::new(bound_h * image_aspect, bound_h)
    }
}

/// Factor mapping an original-pixel length to display pixels.
pub fn scale_factor(original_dim: f64, display_dim: f64) -> f64 {
    display_dim / original_dim
}

/// Position, rotation and offset anchor of a scene node.
///
/// The node's local origin is its top-left corner; `offset` is the local
/// point placed at `position`, and rotation turns around that point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeTransform {
    pub position: Point,
    /// Clockwise degrees, accumulated without wrap-around
    pub rotation: f64,
    pub offset: Point,
}

impl NodeTransform {
    /// A node of `size` centered on `center`, rotating around its middle.
    pub fn centered(center: Point, size: Size) -> Self {
        Self {
            position: center,
            rotation: 0.0,
            offset: size.center(),
        }
    }

    /// Local-to-logical transform: translate(position) · rotate · translate(-offset).
    pub fn matrix(&self) -> Affine {
        Affine::translate(self.position.x, self.position.y)
            * Affine::rotate_degrees(self.rotation)
            * Affine::translate(-self.offset.x, -self.offset.y)
    }

    /// Axis-aligned bounds, in logical space, of a local `size` box after
    /// this transform.
    pub fn client_rect(&self, size: Size) -> Rect {
        self.matrix()
            .map_rect(&Rect::new(0.0, 0.0, size.width, size.height))
    }
}

/// Map a point from original-image pixels into display pixels.
pub fn original_to_display(point: Point, scale_x: f64, scale_y: f64) -> Point {
    Point::new(point.x * scale_x, point.y * scale_y)
}

/// Map a point from display pixels back into original-image pixels.
pub fn display_to_original(point: Point, scale_x: f64, scale_y: f64) -> Point {
    Point::new(point.x / scale_x, point.y / scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_fit_width_bound() {
        // 2:1 image into a square container binds on width
        let size = fit_to_container(2000.0, 1000.0, 1000.0, 1000.0);
        assert_eq!(size, Size::new(800.0, 400.0));
    }

    #[test]
    fn test_fit_height_bound() {
        let size = fit_to_container(500.0, 1000.0, 1000.0, 600.0);
        assert_eq!(size.height, 480.0);
        assert_eq!(size.width, 240.0);
    }

    #[test]
    fn test_fit_square_into_square() {
        let size = fit_to_container(1000.0, 1000.0, 500.0, 500.0);
        assert_eq!(size, Size::new(400.0, 400.0));
    }

    #[test]
    fn test_fit_upscales_small_images() {
        let size = fit_to_container(10.0, 10.0, 1000.0, 1000.0);
        assert_eq!(size, Size::new(800.0, 800.0));
    }

    #[test]
    fn test_scale_factor_mapping() {
        let sx = scale_factor(1000.0, 400.0);
        let p = original_to_display(Point::new(250.0, 500.0), sx, sx);
        assert!((p.x - 100.0).abs() < EPS && (p.y - 200.0).abs() < EPS);
        let back = display_to_original(p, sx, sx);
        assert!((back.x - 250.0).abs() < EPS && (back.y - 500.0).abs() < EPS);
    }

    #[test]
    fn test_centered_node_rect() {
        let node = NodeTransform::centered(Point::new(400.0, 400.0), Size::new(400.0, 200.0));
        let rect = node.client_rect(Size::new(400.0, 200.0));
        assert_eq!(rect, Rect::new(200.0, 300.0, 400.0, 200.0));
    }

    #[test]
    fn test_rotated_node_rect_swaps_axes() {
        let mut node = NodeTransform::centered(Point::new(400.0, 400.0), Size::new(400.0, 200.0));
        node.rotation = 90.0;
        let rect = node.client_rect(Size::new(400.0, 200.0));
        assert_eq!(rect, Rect::new(300.0, 200.0, 200.0, 400.0));

        // Accumulated rotations land on the same rectangle
        node.rotation = 450.0;
        assert_eq!(node.client_rect(Size::new(400.0, 200.0)), rect);
    }

    #[test]
    fn test_rotation_keeps_center_fixed() {
        let mut node = NodeTransform::centered(Point::new(123.0, 45.0), Size::new(60.0, 30.0));
        node.rotation = 37.0;
        let (cx, cy) = node.matrix().apply(30.0, 15.0);
        assert!((cx - 123.0).abs() < EPS && (cy - 45.0).abs() < EPS);
    }
}
