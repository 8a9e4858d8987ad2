use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::RenderError;

/// Decoded RGBA8 pixels shared between scene nodes.
///
/// Cloning is cheap: the pixel buffer and the lazily built premultiplied
/// surface are reference counted.
#[derive(Clone)]
pub struct Bitmap {
    /// Straight-alpha RGBA8 pixel data
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    /// Premultiplied copy used by the rasterizer, built on first draw
    surface: Arc<OnceLock<Option<tiny_skia::Pixmap>>>,
}

impl Bitmap {
    /// Create a bitmap from straight-alpha RGBA8 data.
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::BitmapSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            surface: Arc::new(OnceLock::new()),
        })
    }

    /// Create a single-color bitmap.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RenderError> {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba8(data, width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether two handles share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn surface(&self) -> Option<&tiny_skia::Pixmap> {
        self.surface
            .get_or_init(|| {
                let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)?;
                for (dst, src) in pixmap.pixels_mut().iter_mut().zip(self.data.chunks_exact(4)) {
                    *dst = tiny_skia::ColorU8::from_rgba(src[0], src[1], src[2], src[3])
                        .premultiply();
                }
                Some(pixmap)
            })
            .as_ref()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
