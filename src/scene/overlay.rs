//! Detection overlay: one box and one label per detection.
//!
//! Children are laid out in the image node's local (display) coordinates.
//! The group carries the image node's transform, so rotating or moving the
//! image carries every box along without recomputing them.

use ortho_render::{DrawCommand, DrawList, Rect, TextMetrics, TextStyle};

use crate::config::OverlayStyle;
use crate::geometry::NodeTransform;
use crate::model::Detection;

/// A child of the overlay group.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayNode {
    /// Detection outline in group-local display pixels
    Box { detection_id: i64, rect: Rect },
    /// Label whose top-left corner sits at `(x, y)`
    Label {
        detection_id: i64,
        text: String,
        x: f64,
        y: f64,
    },
}

/// Container for every box and label, transform-locked to the image node.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayGroup {
    transform: NodeTransform,
    children: Vec<OverlayNode>,
    generation: u64,
}

impl OverlayGroup {
    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: NodeTransform) {
        self.transform = transform;
    }

    pub fn children(&self) -> &[OverlayNode] {
        &self.children
    }

    /// Build counter of the renderer that produced this group.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Box rectangles in group-local coordinates.
    pub fn boxes(&self) -> impl Iterator<Item = &Rect> {
        self.children.iter().filter_map(|child| match child {
            OverlayNode::Box { rect, .. } => Some(rect),
            OverlayNode::Label { .. } => None,
        })
    }

    pub fn draw_list(&self, style: &OverlayStyle) -> DrawList {
        let transform = self.transform.matrix();
        let color = style.color();
        let text_style = TextStyle {
            size: style.font_size,
            family: style.font_family.clone(),
            color,
        };

        let mut list = DrawList::new();
        for child in &self.children {
            match child {
                OverlayNode::Box { rect, .. } => list.push(DrawCommand::StrokeRect {
                    rect: *rect,
                    color,
                    width: style.stroke_width,
                    transform,
                }),
                OverlayNode::Label { text, x, y, .. } => list.push(DrawCommand::Text {
                    text: text.clone(),
                    x: *x,
                    y: *y,
                    style: text_style.clone(),
                    transform,
                }),
            }
        }
        list
    }
}

/// Lay out `detections` over an image node.
///
/// Each box `(x1, y1, x2, y2)` in original pixels becomes a rectangle at
/// `(x1 * scale_x, y1 * scale_y)` of size `((x2 - x1) * scale_x, (y2 - y1) * scale_y)`.
/// The label sits above the box, lifted by its measured height plus the
/// style's gap. Boxes outside the image are kept.
pub fn build_overlay(
    detections: &[&Detection],
    transform: NodeTransform,
    scale_x: f64,
    scale_y: f64,
    style: &OverlayStyle,
    generation: u64,
) -> OverlayGroup {
    let metrics = TextMetrics::new(style.font_size);
    let mut children = Vec::with_capacity(detections.len() * 2);

    for detection in detections {
        let b = &detection.bbox;
        let rect = Rect::new(
            b.x1 * scale_x,
            b.y1 * scale_y,
            (b.x2 - b.x1) * scale_x,
            (b.y2 - b.y1) * scale_y,
        );
        let (_, text_height) = metrics.measure(&detection.label);

        children.push(OverlayNode::Box {
            detection_id: detection.id,
            rect,
        });
        children.push(OverlayNode::Label {
            detection_id: detection.id,
            text: detection.label.clone(),
            x: rect.x,
            y: rect.y - text_height - style.label_gap,
        });
    }

    log::debug!(
        "Built overlay generation {} with {} detections (scale {:.4} x {:.4})",
        generation,
        detections.len(),
        scale_x,
        scale_y
    );

    OverlayGroup {
        transform,
        children,
        generation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::model::BoundingBox;

    fn detection(id: i64, bbox: [f64; 4]) -> Detection {
        Detection::new(
            id,
            format!("Fracture Area {}", id),
            BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
        )
    }

    #[test]
    fn test_box_scaled_into_display_space() {
        let d = detection(1, [100.0, 200.0, 300.0, 500.0]);
        let group = build_overlay(
            &[&d],
            NodeTransform::default(),
            0.4,
            0.5,
            &OverlayStyle::default(),
            1,
        );
        let rect = group.boxes().next().copied().unwrap();
        assert_eq!(rect, Rect::new(100.0 * 0.4, 200.0 * 0.5, 200.0 * 0.4, 300.0 * 0.5));
    }

    #[test]
    fn test_label_above_box() {
        let d = detection(7, [10.0, 50.0, 20.0, 60.0]);
        let group = build_overlay(
            &[&d],
            NodeTransform::default(),
            1.0,
            1.0,
            &OverlayStyle::default(),
            1,
        );
        match &group.children()[1] {
            OverlayNode::Label { text, x, y, .. } => {
                assert_eq!(text, "Fracture Area 7");
                assert_eq!(*x, 10.0);
                // 14px text plus the 4px gap
                assert_eq!(*y, 50.0 - 14.0 - 4.0);
            }
            other => panic!("expected label, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_detections() {
        let transform = NodeTransform::centered(Point::new(400.0, 300.0), Size::new(200.0, 100.0));
        let group = build_overlay(&[], transform, 1.0, 1.0, &OverlayStyle::default(), 3);
        assert!(group.children().is_empty());
        assert_eq!(group.transform(), &transform);
        assert!(group.draw_list(&OverlayStyle::default()).is_empty());
    }

    #[test]
    fn test_box_outside_image_is_kept() {
        let d = detection(2, [-50.0, -50.0, 5000.0, 10.0]);
        let group = build_overlay(
            &[&d],
            NodeTransform::default(),
            0.5,
            0.5,
            &OverlayStyle::default(),
            1,
        );
        assert_eq!(group.boxes().count(), 1);
    }

    #[test]
    fn test_draw_list_uses_group_transform() {
        let transform = NodeTransform {
            position: Point::new(400.0, 300.0),
            rotation: 90.0,
            offset: Point::new(100.0, 50.0),
        };
        let d = detection(1, [0.0, 0.0, 10.0, 10.0]);
        let group = build_overlay(&[&d], transform, 1.0, 1.0, &OverlayStyle::default(), 1);
        let list = group.draw_list(&OverlayStyle::default());
        assert_eq!(list.len(), 2);
        for command in list.commands() {
            assert_eq!(command.transform(), transform.matrix());
        }
    }
}
