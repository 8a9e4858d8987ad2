//! Layered scene: an image layer and a detection overlay layer.
//!
//! The overlay group's transform always equals the image node's. Every
//! change to the image transform goes through
//! [`SceneRenderer::set_image_transform`], which writes both nodes.

mod overlay;
mod paint_gate;

pub use overlay::{OverlayGroup, OverlayNode, build_overlay};
pub use paint_gate::PaintGate;

use ortho_render::{Bitmap, Canvas, Color, DrawCommand, DrawList, RenderError};

use crate::config::OverlayStyle;
use crate::constants::placeholder;
use crate::geometry::{NodeTransform, Rect, Size, fit_to_container_with_ratio, scale_factor};
use crate::model::Detection;
use crate::viewport::ViewportState;

/// Pixels shown by the image node.
#[derive(Debug, Clone)]
pub enum ImageContent {
    Decoded(Bitmap),
    /// Stand-in for an image that failed to load
    Placeholder,
}

/// The base image, fitted into the container.
#[derive(Debug, Clone)]
pub struct ImageNode {
    content: ImageContent,
    natural: Size,
    display: Size,
    transform: NodeTransform,
}

impl ImageNode {
    pub fn content(&self) -> &ImageContent {
        &self.content
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, ImageContent::Placeholder)
    }

    /// Pixel size of the loaded image.
    pub fn natural_size(&self) -> Size {
        self.natural
    }

    /// Fitted size in logical pixels, before rotation.
    pub fn display_size(&self) -> Size {
        self.display
    }

    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    /// Post-rotation bounding box in logical coordinates.
    pub fn client_rect(&self) -> Rect {
        self.transform.client_rect(self.display)
    }

    fn draw_list(&self) -> DrawList {
        let transform = self.transform.matrix();
        let mut list = DrawList::new();
        match &self.content {
            ImageContent::Decoded(bitmap) => list.push(DrawCommand::Image {
                bitmap: bitmap.clone(),
                width: self.display.width,
                height: self.display.height,
                transform,
            }),
            ImageContent::Placeholder => {
                let rect = Rect::new(0.0, 0.0, self.display.width, self.display.height);
                let [r, g, b, _] = placeholder::FILL;
                list.push(DrawCommand::FillRect {
                    rect,
                    color: Color::from_rgb8([r, g, b]),
                    transform,
                });
                list.push(DrawCommand::StrokeRect {
                    rect,
                    color: Color::from_rgb8(placeholder::OUTLINE),
                    width: 2.0,
                    transform,
                });
            }
        }
        list
    }
}

/// A drawable layer that can be hidden without discarding its content.
#[derive(Debug, Clone)]
pub struct Layer<T> {
    content: Option<T>,
    visible: bool,
}

impl<T> Default for Layer<T> {
    fn default() -> Self {
        Self {
            content: None,
            visible: true,
        }
    }
}

impl<T> Layer<T> {
    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn content_mut(&mut self) -> Option<&mut T> {
        self.content.as_mut()
    }

    fn replace(&mut self, content: Option<T>) -> Option<T> {
        std::mem::replace(&mut self.content, content)
    }
}

/// Owns the scene nodes of one canvas and turns them into draw lists.
#[derive(Debug)]
pub struct SceneRenderer {
    image_layer: Layer<ImageNode>,
    overlay_layer: Layer<OverlayGroup>,
    style: OverlayStyle,
    fit_ratio: f64,
    overlay_builds: u64,
}

impl SceneRenderer {
    pub fn new(style: OverlayStyle, fit_ratio: f64) -> Self {
        Self {
            image_layer: Layer::default(),
            overlay_layer: Layer::default(),
            style,
            fit_ratio,
            overlay_builds: 0,
        }
    }

    pub fn image(&self) -> Option<&ImageNode> {
        self.image_layer.content()
    }

    pub fn overlay(&self) -> Option<&OverlayGroup> {
        self.overlay_layer.content()
    }

    pub fn has_image(&self) -> bool {
        self.image_layer.content().is_some()
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Create the image node, fitted and centered in `container`.
    ///
    /// Any previous image and overlay are discarded.
    pub fn build_image(&mut self, content: ImageContent, natural: Size, container: Size) {
        let display = fit_to_container_with_ratio(
            natural.width,
            natural.height,
            container.width,
            container.height,
            self.fit_ratio,
        );
        let transform = NodeTransform::centered(container.center(), display);

        log::info!(
            "Image node {}x{} displayed at {:.1}x{:.1}{}",
            natural.width,
            natural.height,
            display.width,
            display.height,
            if matches!(content, ImageContent::Placeholder) {
                " (placeholder)"
            } else {
                ""
            }
        );

        self.overlay_layer.replace(None);
        self.image_layer.replace(Some(ImageNode {
            content,
            natural,
            display,
            transform,
        }));
    }

    /// Apply `transform` to the image node and the overlay group together.
    pub fn set_image_transform(&mut self, transform: NodeTransform) {
        let Some(image) = self.image_layer.content_mut() else {
            return;
        };
        image.transform = transform;
        if let Some(group) = self.overlay_layer.content_mut() {
            group.set_transform(transform);
        }
    }

    /// Set the image rotation, keeping position and offset.
    pub fn set_rotation(&mut self, degrees: f64) {
        if let Some(image) = self.image() {
            let transform = NodeTransform {
                rotation: degrees,
                ..*image.transform()
            };
            self.set_image_transform(transform);
        }
    }

    /// Put the image back at the middle of `container` with no rotation.
    pub fn recenter(&mut self, container: Size) {
        if let Some(image) = self.image() {
            let transform = NodeTransform::centered(container.center(), image.display_size());
            self.set_image_transform(transform);
        }
    }

    /// Tear down the current overlay and build a new one from `detections`.
    ///
    /// `original` is the pixel size the detection boxes refer to. Without
    /// it no boxes can be placed and the new group is empty.
    pub fn rebuild_overlay(&mut self, detections: &[&Detection], original: Option<Size>) {
        let Some(image) = self.image() else {
            return;
        };
        let transform = *image.transform();
        let display = image.display_size();

        self.overlay_builds += 1;
        let group = match original.filter(|s| !s.is_empty()) {
            Some(original) => build_overlay(
                detections,
                transform,
                scale_factor(original.width, display.width),
                scale_factor(original.height, display.height),
                &self.style,
                self.overlay_builds,
            ),
            None => {
                if !detections.is_empty() {
                    log::warn!(
                        "Detection result has no image dimensions; skipping {} boxes",
                        detections.len()
                    );
                }
                build_overlay(&[], transform, 1.0, 1.0, &self.style, self.overlay_builds)
            }
        };
        self.overlay_layer.replace(Some(group));
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_layer.is_visible()
    }

    /// Show or hide the overlay layer. The group itself is untouched.
    pub fn set_overlay_visible(&mut self, visible: bool) {
        self.overlay_layer.set_visible(visible);
    }

    /// Commands for the visible layers, in logical coordinates.
    pub fn draw_list(&self) -> DrawList {
        let mut list = DrawList::new();
        if self.image_layer.is_visible() {
            if let Some(image) = self.image() {
                list.extend(&image.draw_list());
            }
        }
        if self.overlay_layer.is_visible() {
            if let Some(group) = self.overlay() {
                list.extend(&group.draw_list(&self.style));
            }
        }
        list
    }

    /// Rasterize what the user sees: the whole container through the viewport.
    pub fn render_viewport(
        &self,
        viewport: &ViewportState,
        container: Size,
    ) -> Result<Canvas, RenderError> {
        let mut canvas = Canvas::new(
            container.width.round() as u32,
            container.height.round() as u32,
        )?
        .with_base_transform(viewport.matrix());
        canvas.clear(Color::TRANSPARENT);
        canvas.draw(&self.draw_list());
        Ok(canvas)
    }

    /// Drop every node. Visibility settings are kept.
    pub fn clear(&mut self) {
        self.image_layer.replace(None);
        self.overlay_layer.replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::BoundingBox;

    fn renderer_with_image() -> SceneRenderer {
        let mut renderer = SceneRenderer::new(OverlayStyle::default(), 0.8);
        let bitmap = Bitmap::solid(10, 10, [255, 0, 0, 255]).unwrap();
        renderer.build_image(
            ImageContent::Decoded(bitmap),
            Size::new(1000.0, 500.0),
            Size::new(800.0, 600.0),
        );
        renderer
    }

    fn detections() -> Vec<Detection> {
        vec![
            Detection::new(1, "Fracture Area 1", BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            Detection::new(2, "Fracture Area 2", BoundingBox::new(500.0, 250.0, 600.0, 300.0)),
        ]
    }

    #[test]
    fn test_build_image_fits_and_centers() {
        let renderer = renderer_with_image();
        let image = renderer.image().unwrap();
        assert_eq!(image.display_size(), Size::new(640.0, 320.0));
        assert_eq!(image.transform().position, Point::new(400.0, 300.0));
        assert_eq!(image.transform().offset, Point::new(320.0, 160.0));
        let rect = image.client_rect();
        assert!((rect.x - 80.0).abs() < 1e-9);
        assert!((rect.y - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_reaches_overlay() {
        let mut renderer = renderer_with_image();
        let ds = detections();
        let refs: Vec<&Detection> = ds.iter().collect();
        renderer.rebuild_overlay(&refs, Some(Size::new(1000.0, 500.0)));

        for step in 1..=5 {
            renderer.set_rotation(f64::from(step * 90));
            let image = renderer.image().unwrap().transform();
            let group = renderer.overlay().unwrap().transform();
            assert_eq!(image, group);
        }
    }

    #[test]
    fn test_rebuild_replaces_group() {
        let mut renderer = renderer_with_image();
        let ds = detections();
        let refs: Vec<&Detection> = ds.iter().collect();
        renderer.rebuild_overlay(&refs, Some(Size::new(1000.0, 500.0)));
        assert_eq!(renderer.overlay().unwrap().children().len(), 4);
        let first = renderer.overlay().unwrap().generation();

        renderer.rebuild_overlay(&refs[..1], Some(Size::new(1000.0, 500.0)));
        let group = renderer.overlay().unwrap();
        assert_eq!(group.children().len(), 2);
        assert!(group.generation() > first);
    }

    #[test]
    fn test_visibility_does_not_rebuild() {
        let mut renderer = renderer_with_image();
        let ds = detections();
        let refs: Vec<&Detection> = ds.iter().collect();
        renderer.rebuild_overlay(&refs, Some(Size::new(1000.0, 500.0)));
        let generation = renderer.overlay().unwrap().generation();
        let with_overlay = renderer.draw_list().len();

        renderer.set_overlay_visible(false);
        assert_eq!(renderer.draw_list().len(), 1);
        renderer.set_overlay_visible(true);
        assert_eq!(renderer.draw_list().len(), with_overlay);
        assert_eq!(renderer.overlay().unwrap().generation(), generation);
    }

    #[test]
    fn test_missing_dimensions_give_empty_overlay() {
        let mut renderer = renderer_with_image();
        let ds = detections();
        let refs: Vec<&Detection> = ds.iter().collect();
        renderer.rebuild_overlay(&refs, None);
        assert!(renderer.overlay().unwrap().children().is_empty());
    }

    #[test]
    fn test_no_image_is_noop() {
        let mut renderer = SceneRenderer::new(OverlayStyle::default(), 0.8);
        renderer.set_rotation(90.0);
        renderer.recenter(Size::new(100.0, 100.0));
        renderer.rebuild_overlay(&[], Some(Size::new(10.0, 10.0)));
        assert!(renderer.image().is_none());
        assert!(renderer.overlay().is_none());
        assert!(renderer.draw_list().is_empty());
    }

    #[test]
    fn test_render_viewport_applies_zoom() {
        let renderer = renderer_with_image();
        let viewport = ViewportState {
            zoom_scale: 0.5,
            ..ViewportState::default()
        };
        let canvas = renderer
            .render_viewport(&viewport, Size::new(800.0, 600.0))
            .unwrap();
        assert_eq!((canvas.width(), canvas.height()), (800, 600));
        // Image center (400, 300) lands at (200, 150) at half zoom
        let [r, g, _, a] = canvas.pixel(200, 150).unwrap();
        assert!(r >= 250 && g <= 5 && a >= 250);
        assert_eq!(canvas.pixel(700, 500).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_placeholder_draws_panel() {
        let mut renderer = SceneRenderer::new(OverlayStyle::default(), 0.8);
        renderer.build_image(
            ImageContent::Placeholder,
            Size::new(512.0, 512.0),
            Size::new(500.0, 500.0),
        );
        assert!(renderer.image().unwrap().is_placeholder());
        let canvas = renderer
            .render_viewport(&ViewportState::default(), Size::new(500.0, 500.0))
            .unwrap();
        assert_eq!(canvas.pixel(250, 250), Some([200, 200, 200, 255]));
    }
}
