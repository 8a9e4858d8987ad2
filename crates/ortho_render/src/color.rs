/// An RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const GREEN: Color = Color {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from 8-bit RGB components.
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::rgb(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        )
    }

    /// Parse `#rrggbb` (alpha is always opaque).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::from_rgb8([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.to_rgba8();
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let green = Color::from_hex("#00ff00").unwrap();
        assert_eq!(green, Color::GREEN);
        assert_eq!(green.to_hex(), "#00ff00");
        assert_eq!(Color::from_hex("#ABCDEF").unwrap().to_hex(), "#abcdef");
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(Color::from_hex("00ff00").is_none());
        assert!(Color::from_hex("#00ff0").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }
}
