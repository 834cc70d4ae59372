//! Color types and conversion to the hub's native byte order.
//!
//! The generic lighting layer works in RGB. The Uni Hub expects every LED
//! as red, blue, green on the wire.

use serde::{Deserialize, Serialize};

/// Per-channel ceiling applied by the white limiter.
pub const WHITE_LIMIT: u8 = 0x99;

/// A color in generic RGB order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, `#RRGGBB` or `0xRRGGBB`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s
            .trim()
            .trim_start_matches('#')
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }
}

impl std::fmt::Display for RgbColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A color in the hub's red, blue, green order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rbg {
    pub r: u8,
    pub b: u8,
    pub g: u8,
}

impl Rbg {
    pub const BLACK: Rbg = Rbg { r: 0, b: 0, g: 0 };

    /// Convert from RGB, scaling each byte by `brightness` (clamped to 0..=1).
    pub fn scaled(color: RgbColor, brightness: f32) -> Self {
        let factor = if brightness.is_nan() {
            0.0
        } else {
            brightness.clamp(0.0, 1.0)
        };
        let scale = |v: u8| (v as f32 * factor) as u8;
        Self {
            r: scale(color.r),
            b: scale(color.b),
            g: scale(color.g),
        }
    }

    /// Cap near-white colors to the manufacturer's current limit.
    pub fn limited(self) -> Self {
        if self.r > WHITE_LIMIT && self.g > WHITE_LIMIT && self.b > WHITE_LIMIT {
            Self {
                r: WHITE_LIMIT,
                b: WHITE_LIMIT,
                g: WHITE_LIMIT,
            }
        } else {
            self
        }
    }

    /// Wire bytes.
    pub fn bytes(&self) -> [u8; 3] {
        [self.r, self.b, self.g]
    }

    /// Back to generic RGB.
    pub fn to_rgb(self) -> RgbColor {
        RgbColor::new(self.r, self.g, self.b)
    }
}

impl From<RgbColor> for Rbg {
    fn from(color: RgbColor) -> Self {
        Self::scaled(color, 1.0)
    }
}

/// Flatten a slice of device colors into wire bytes.
pub fn to_wire(colors: &[Rbg]) -> Vec<u8> {
    colors.iter().flat_map(|c| c.bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_order_is_red_blue_green() {
        let rbg = Rbg::from(RgbColor::new(0x11, 0x22, 0x33));
        assert_eq!(rbg.bytes(), [0x11, 0x33, 0x22]);
    }

    #[test]
    fn full_brightness_roundtrip_is_exact() {
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(51) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    let rgb = RgbColor::new(r, g, b);
                    assert_eq!(Rbg::scaled(rgb, 1.0).to_rgb(), rgb);
                }
            }
        }
    }

    #[test]
    fn brightness_scales_each_byte() {
        let rbg = Rbg::scaled(RgbColor::new(200, 100, 50), 0.5);
        assert_eq!(rbg.bytes(), [100, 25, 50]);
    }

    #[test]
    fn brightness_is_clamped() {
        let c = RgbColor::new(10, 20, 30);
        assert_eq!(Rbg::scaled(c, 3.0).to_rgb(), c);
        assert_eq!(Rbg::scaled(c, -1.0), Rbg::BLACK);
        assert_eq!(Rbg::scaled(c, f32::NAN), Rbg::BLACK);
    }

    #[test]
    fn limiter_caps_white_only() {
        let white = Rbg::from(RgbColor::new(255, 255, 255)).limited();
        assert_eq!(white.bytes(), [WHITE_LIMIT; 3]);
        let red = Rbg::from(RgbColor::new(255, 0, 0)).limited();
        assert_eq!(red.bytes(), [255, 0, 0]);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(RgbColor::from_hex("#FF8000"), Some(RgbColor::new(255, 128, 0)));
        assert_eq!(RgbColor::from_hex("0x00ff00"), Some(RgbColor::new(0, 255, 0)));
        assert_eq!(RgbColor::from_hex("123456").unwrap().to_string(), "#123456");
        assert_eq!(RgbColor::from_hex("fff"), None);
        assert_eq!(RgbColor::from_hex("zzzzzz"), None);
    }

    #[test]
    fn wire_flattening() {
        let colors = [Rbg { r: 1, b: 2, g: 3 }, Rbg { r: 4, b: 5, g: 6 }];
        assert_eq!(to_wire(&colors), vec![1, 2, 3, 4, 5, 6]);
    }
}
