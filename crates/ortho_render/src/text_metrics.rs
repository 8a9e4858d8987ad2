//! Text measurement utilities.
//!
//! Label placement needs text extents before anything is rasterized, so
//! these are estimates from font metrics rather than shaped glyph runs.

/// Metrics for a specific font/size combination.
#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    /// Font size in pixels
    pub size: f64,
    /// Average character width as a ratio of font size
    pub char_width_ratio: f64,
    /// Line height as a ratio of font size
    pub line_height_ratio: f64,
}

impl TextMetrics {
    /// Proportional sans-serif at line height 1.0, matching a browser
    /// canvas text node with default line spacing.
    pub const SANS: TextMetrics = TextMetrics {
        size: 14.0,
        char_width_ratio: 0.55,
        line_height_ratio: 1.0,
    };

    /// Create sans-serif metrics for a specific font size.
    pub fn new(size: f64) -> Self {
        Self {
            size,
            ..Self::SANS
        }
    }

    /// Estimate the width of a single line of text.
    pub fn line_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.size * self.char_width_ratio
    }

    /// Get the line height.
    pub fn line_height(&self) -> f64 {
        self.size * self.line_height_ratio
    }

    /// Estimate dimensions for multi-line text.
    pub fn measure(&self, text: &str) -> (f64, f64) {
        let lines: Vec<&str> = text.lines().collect();

        // Empty string still occupies one line
        let line_count = lines.len().max(1);

        let width = lines
            .iter()
            .map(|line| self.line_width(line))
            .fold(0.0f64, f64::max);

        (width, line_count as f64 * self.line_height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_height_equals_font_size() {
        let metrics = TextMetrics::new(14.0);
        let (_, h) = metrics.measure("Fracture Area 1");
        assert_eq!(h, 14.0);
    }

    #[test]
    fn test_multiline() {
        let metrics = TextMetrics::new(10.0);
        let (w, h) = metrics.measure("ab\nabcd");
        assert_eq!(h, 20.0);
        assert!((w - 4.0 * 10.0 * 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text() {
        let (w, h) = TextMetrics::new(12.0).measure("");
        assert_eq!(w, 0.0);
        assert_eq!(h, 12.0);
    }
}
