//! CPU raster surface executing draw lists.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tiny_skia::{FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke};

use crate::text;
use crate::{Affine, Color, DrawCommand, DrawList, Rect, RenderError};

/// A raster surface.
///
/// The base transform maps logical (scene) coordinates to surface pixels;
/// it is how the viewport transform or an export crop is applied without
/// touching the draw commands themselves.
pub struct Canvas {
    pixmap: Pixmap,
    base: Affine,
}

impl Canvas {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSurface { width, height })?;
        Ok(Self {
            pixmap,
            base: Affine::IDENTITY,
        })
    }

    /// Set the logical-to-surface transform used for subsequent draws.
    pub fn with_base_transform(mut self, base: Affine) -> Self {
        self.base = base;
        self
    }

    pub fn base_transform(&self) -> Affine {
        self.base
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Execute every command of `list` in order.
    pub fn draw(&mut self, list: &DrawList) {
        for command in list.commands() {
            self.draw_command(command);
        }
    }

    fn draw_command(&mut self, command: &DrawCommand) {
        let transform = self.base * command.transform();

        match command {
            DrawCommand::Image {
                bitmap,
                width,
                height,
                ..
            } => {
                let Some(surface) = bitmap.surface() else {
                    log::warn!("Skipping image with empty surface {:?}", bitmap);
                    return;
                };
                let fit = Affine::scale(
                    width / f64::from(bitmap.width()),
                    height / f64::from(bitmap.height()),
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bicubic,
                    ..PixmapPaint::default()
                };
                self.pixmap
                    .draw_pixmap(0, 0, surface.as_ref(), &paint, (transform * fit).to_skia(), None);
            }
            DrawCommand::FillRect { rect, color, .. } => {
                if let Some(r) = skia_rect(rect) {
                    self.pixmap
                        .fill_rect(r, &solid_paint(*color), transform.to_skia(), None);
                }
            }
            DrawCommand::StrokeRect {
                rect, color, width, ..
            } => {
                let Some(path) = skia_rect(rect).map(PathBuilder::from_rect) else {
                    return;
                };
                let stroke = Stroke {
                    width: *width as f32,
                    ..Stroke::default()
                };
                self.pixmap.stroke_path(
                    &path,
                    &solid_paint(*color),
                    &stroke,
                    transform.to_skia(),
                    None,
                );
            }
            DrawCommand::Text {
                text,
                x,
                y,
                style,
                transform: local,
            } => {
                text::draw_text(&mut self.pixmap, &self.base, text, *x, *y, style, local);
            }
        }
    }

    /// Read one pixel as straight-alpha RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Copy out straight-alpha RGBA8 pixels.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Encode the surface as PNG at maximum compression.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let rgba = self.to_rgba8();
        let mut bytes = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive);
        encoder.write_image(&rgba, self.width(), self.height(), ExtendedColorType::Rgba8)?;
        log::debug!(
            "Encoded {}x{} PNG ({} bytes)",
            self.width(),
            self.height(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn skia_rect(rect: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bitmap;

    #[test]
    fn test_zero_surface_rejected() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(RenderError::InvalidSurface { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_image_is_stretched_to_destination() {
        let bitmap = Bitmap::solid(2, 2, [200, 10, 10, 255]).unwrap();
        let mut list = DrawList::new();
        list.push(DrawCommand::Image {
            bitmap,
            width: 8.0,
            height: 8.0,
            transform: Affine::translate(1.0, 1.0),
        });

        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.draw(&list);

        let center = canvas.pixel(5, 5).unwrap();
        let expected = [200u8, 10, 10, 255];
        assert!(
            center.iter().zip(expected).all(|(a, b)| a.abs_diff(b) <= 2),
            "got {:?}",
            center
        );
        assert_eq!(canvas.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(canvas.pixel(9, 9).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_base_transform_scales_output() {
        let mut list = DrawList::new();
        list.push(DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 2.0, 2.0),
            color: Color::WHITE,
            transform: Affine::IDENTITY,
        });

        let mut canvas = Canvas::new(8, 8)
            .unwrap()
            .with_base_transform(Affine::scale(2.0, 2.0));
        canvas.draw(&list);

        assert_eq!(canvas.pixel(3, 3), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(5, 5).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let mut canvas = Canvas::new(4, 3).unwrap();
        canvas.clear(Color::BLACK);
        let png = canvas.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
