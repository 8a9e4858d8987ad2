//! Text rasterization through resvg.
//!
//! tiny-skia has no text support, so each label is rendered as a one-element
//! SVG document. A bundled face is always registered so labels render on
//! hosts without system fonts (including wasm32); native builds also pick
//! up system fonts.

use std::fmt::Write;
use std::sync::{Arc, OnceLock};

use resvg::usvg;

use crate::{Affine, TextStyle};

/// Baseline offset as a ratio of font size for typical sans-serif ascent.
const ASCENT_RATIO: f64 = 0.8;

/// Family name of the bundled label face.
pub const LABEL_FONT_FAMILY: &str = "DejaVu Sans";

const LABEL_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Global font database using lazy initialization.
static FONT_DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

pub(crate) fn font_database() -> Arc<usvg::fontdb::Database> {
    FONT_DB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_font_data(LABEL_FONT.to_vec());
            #[cfg(not(target_arch = "wasm32"))]
            db.load_system_fonts();
            // Generic families fall back to the bundled face.
            db.set_sans_serif_family(LABEL_FONT_FAMILY);
            log::debug!("Loaded {} font faces for label rendering", db.len());
            Arc::new(db)
        })
        .clone()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build the SVG document for a single text command.
pub(crate) fn text_svg(
    text: &str,
    x: f64,
    y: f64,
    style: &TextStyle,
    transform: &Affine,
    surface: (u32, u32),
) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        surface.0.max(1),
        surface.1.max(1)
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="{}" font-family="{}" fill="{}" fill-opacity="{}" transform="{}">{}</text></svg>"#,
        x,
        y + style.size * ASCENT_RATIO,
        style.size,
        escape_xml(&style.family),
        style.color.to_hex(),
        style.color.a,
        transform.to_svg(),
        escape_xml(text),
    );
    svg
}

/// Render text onto `pixmap`. Failures are logged and skipped: a missing
/// label must never abort a frame or an export.
pub(crate) fn draw_text(
    pixmap: &mut tiny_skia::Pixmap,
    base: &Affine,
    text: &str,
    x: f64,
    y: f64,
    style: &TextStyle,
    transform: &Affine,
) {
    if text.is_empty() {
        return;
    }

    let svg = text_svg(
        text,
        x,
        y,
        style,
        transform,
        (pixmap.width(), pixmap.height()),
    );

    let mut options = usvg::Options::default();
    options.fontdb = font_database();

    match usvg::Tree::from_str(&svg, &options) {
        Ok(tree) => resvg::render(&tree, base.to_skia(), &mut pixmap.as_mut()),
        Err(e) => log::warn!("Failed to build label '{}': {:?}", text, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn test_svg_escapes_label() {
        let style = TextStyle {
            size: 14.0,
            family: LABEL_FONT_FAMILY.to_string(),
            color: Color::GREEN,
        };
        let svg = text_svg("A<B & \"C\"", 10.0, 20.0, &style, &Affine::IDENTITY, (100, 50));
        assert!(svg.contains("A&lt;B &amp; &quot;C&quot;"));
        assert!(svg.contains(r##"fill="#00ff00""##));
        assert!(svg.contains(r#"x="10""#));
        assert!(svg.contains(r#"font-size="14""#));
    }

    #[test]
    fn test_bundled_face_is_registered() {
        let db = font_database();
        let query = usvg::fontdb::Query {
            families: &[usvg::fontdb::Family::SansSerif],
            ..Default::default()
        };
        assert!(db.query(&query).is_some());
        let named = usvg::fontdb::Query {
            families: &[usvg::fontdb::Family::Name(LABEL_FONT_FAMILY)],
            ..Default::default()
        };
        assert!(db.query(&named).is_some());
    }

    #[test]
    fn test_draw_text_paints_pixels() {
        let mut pixmap = tiny_skia::Pixmap::new(120, 40).unwrap();
        let style = TextStyle {
            size: 14.0,
            family: format!("{}, sans-serif", LABEL_FONT_FAMILY),
            color: Color::GREEN,
        };
        draw_text(
            &mut pixmap,
            &Affine::IDENTITY,
            "Fracture 97%",
            4.0,
            10.0,
            &style,
            &Affine::IDENTITY,
        );
        let painted = pixmap
            .data()
            .chunks_exact(4)
            .filter(|px| px[1] > 100 && px[3] > 0)
            .count();
        assert!(painted > 20, "only {} label pixels painted", painted);
    }
}
