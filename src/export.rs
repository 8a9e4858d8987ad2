//! Snapshot export of the image region.
//!
//! The exported raster covers exactly the image node's post-rotation
//! bounding box in logical coordinates, scaled by the pixel ratio. Zoom and
//! pan do not affect it. The overlay is included only while its layer is
//! visible.

use ortho_render::{Affine, Canvas, Color};

use crate::error::ExportError;
use crate::model::DetectionResult;
use crate::scene::SceneRenderer;

/// An encoded export.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Rasterize the image region of `renderer` at `pixel_ratio` and encode it as PNG.
pub fn export_region(renderer: &SceneRenderer, pixel_ratio: f64) -> Result<Snapshot, ExportError> {
    let image = renderer.image().ok_or(ExportError::NoImage)?;
    let region = image.client_rect();

    let width = (region.width * pixel_ratio).round();
    let height = (region.height * pixel_ratio).round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(ExportError::EmptyRegion { width, height });
    }
    let (width, height) = (width as u32, height as u32);

    let base = Affine::scale(pixel_ratio, pixel_ratio) * Affine::translate(-region.x, -region.y);
    let mut canvas = Canvas::new(width, height)?.with_base_transform(base);
    canvas.clear(Color::TRANSPARENT);
    canvas.draw(&renderer.draw_list());

    let png = canvas.encode_png()?;
    log::info!(
        "Exported {}x{} region at ({:.1}, {:.1}), overlay {}",
        width,
        height,
        region.x,
        region.y,
        if renderer.overlay_visible() { "shown" } else { "hidden" }
    );

    Ok(Snapshot { png, width, height })
}

/// `<product>-<classification>.png`, with spaces in the classification
/// turned into dashes, or `<product>-image.png` without a result.
pub fn export_filename(product: &str, result: Option<&DetectionResult>) -> String {
    let suffix = result
        .map(|r| r.classification.label().replace(' ', "-"))
        .unwrap_or_else(|| "image".to_string());
    format!("{}-{}.png", product, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayStyle;
    use crate::geometry::Size;
    use crate::model::Classification;
    use crate::scene::ImageContent;
    use ortho_render::Bitmap;

    fn renderer(natural: Size, container: Size) -> SceneRenderer {
        let mut renderer = SceneRenderer::new(OverlayStyle::default(), 0.8);
        let bitmap = Bitmap::solid(8, 8, [30, 60, 90, 255]).unwrap();
        renderer.build_image(ImageContent::Decoded(bitmap), natural, container);
        renderer
    }

    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        let image = image::load_from_memory(png).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn test_no_image() {
        let renderer = SceneRenderer::new(OverlayStyle::default(), 0.8);
        assert!(matches!(export_region(&renderer, 2.0), Err(ExportError::NoImage)));
    }

    #[test]
    fn test_square_region_at_double_density() {
        let renderer = renderer(Size::new(1000.0, 1000.0), Size::new(500.0, 500.0));
        let snapshot = export_region(&renderer, 2.0).unwrap();
        assert_eq!((snapshot.width, snapshot.height), (800, 800));
        assert_eq!(png_dimensions(&snapshot.png), (800, 800));
    }

    #[test]
    fn test_rotated_region_swaps_axes() {
        let mut renderer = renderer(Size::new(1000.0, 500.0), Size::new(500.0, 500.0));
        assert_eq!(renderer.image().unwrap().display_size(), Size::new(400.0, 200.0));
        renderer.set_rotation(90.0);
        let snapshot = export_region(&renderer, 2.0).unwrap();
        assert_eq!((snapshot.width, snapshot.height), (400, 800));
    }

    #[test]
    fn test_region_is_filled_by_image() {
        let renderer = renderer(Size::new(100.0, 50.0), Size::new(500.0, 500.0));
        let snapshot = export_region(&renderer, 1.0).unwrap();
        let image = image::load_from_memory(&snapshot.png).unwrap().to_rgba8();
        let center = image.get_pixel(snapshot.width / 2, snapshot.height / 2);
        assert_eq!(center.0[3], 255);
    }

    #[test]
    fn test_filename() {
        assert_eq!(export_filename("Orthovision", None), "Orthovision-image.png");

        let mut result = DetectionResult::default();
        assert_eq!(
            export_filename("Orthovision", Some(&result)),
            "Orthovision-Non-Fractured.png"
        );
        result.classification = Classification::Fractured;
        assert_eq!(
            export_filename("Orthovision", Some(&result)),
            "Orthovision-Fractured.png"
        );
    }
}
