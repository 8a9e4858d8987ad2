//! ortho_render - retained drawing primitives and CPU rasterization
//!
//! Scene code records [`DrawCommand`]s into a [`DrawList`]; a [`Canvas`]
//! executes them on a `tiny-skia` pixmap and encodes the result as PNG.

mod bitmap;
mod canvas;
mod color;
mod draw;
mod error;
mod text;
mod text_metrics;
mod transform;

pub use bitmap::Bitmap;
pub use canvas::Canvas;
pub use color::Color;
pub use draw::{DrawCommand, DrawList, TextStyle};
pub use text::LABEL_FONT_FAMILY;
pub use error::RenderError;
pub use text_metrics::TextMetrics;
pub use transform::{Affine, Rect};
