use std::fmt;

use crate::geometry::{Affine, Point};

/// Zoom, pan and rotation of one canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Image rotation in degrees, a multiple of 90, accumulated without wrap-around
    pub rotation_degrees: i32,
    /// Viewport scale (1.0 = 100%)
    pub zoom_scale: f64,
    /// Viewport translation in screen pixels
    pub pan_offset: Point,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            rotation_degrees: 0,
            zoom_scale: 1.0,
            pan_offset: Point::ORIGIN,
        }
    }
}

impl ViewportState {
    /// Zoom as a rounded percentage.
    pub fn zoom_percent(&self) -> i64 {
        (self.zoom_scale * 100.0).round() as i64
    }

    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> i32 {
        self.rotation_degrees.rem_euclid(360)
    }

    /// Logical-to-screen transform: translate(pan) · scale(zoom).
    pub fn matrix(&self) -> Affine {
        Affine::translate(self.pan_offset.x, self.pan_offset.y)
            * Affine::scale(self.zoom_scale, self.zoom_scale)
    }

    /// Map a screen position to logical (layer) coordinates.
    pub fn screen_to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_offset.x) / self.zoom_scale,
            (screen.y - self.pan_offset.y) / self.zoom_scale,
        )
    }

    /// Map a logical point to screen coordinates.
    pub fn logical_to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.zoom_scale + self.pan_offset.x,
            logical.y * self.zoom_scale + self.pan_offset.y,
        )
    }
}

/// Sidebar-style read-out: `Zoom: 150% | Rotation: 90° | Pan: (12, -40)`.
impl fmt::Display for ViewportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {}% | Rotation: {}° | Pan: ({}, {})",
            self.zoom_percent(),
            self.rotation_degrees,
            // Adding zero folds -0 into 0
            self.pan_offset.x.round() + 0.0,
            self.pan_offset.y.round() + 0.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readout_formatting() {
        let state = ViewportState {
            rotation_degrees: 450,
            zoom_scale: 1.4999,
            pan_offset: Point::new(12.4, -39.6),
        };
        assert_eq!(state.zoom_percent(), 150);
        assert_eq!(state.normalized_rotation(), 90);
        assert_eq!(state.to_string(), "Zoom: 150% | Rotation: 450° | Pan: (12, -40)");
    }

    #[test]
    fn test_screen_logical_inverse() {
        let state = ViewportState {
            rotation_degrees: 0,
            zoom_scale: 2.5,
            pan_offset: Point::new(-30.0, 12.0),
        };
        let p = Point::new(100.0, 50.0);
        let back = state.logical_to_screen(state.screen_to_logical(p));
        assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
        assert_eq!(state.matrix().apply(4.0, 4.0), (-20.0, 22.0));
    }
}
