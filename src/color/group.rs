//! Discrete color buckets used for grouping pieces
//!
//! Classification rule (first match wins):
//! 1. brightness > 200 → `Light`
//! 2. brightness < 60 → `Dark`
//! 3. blue strictly greatest → `Blue`
//! 4. green strictly greatest → `Green`
//! 5. red strictly greatest → `YellowOrange` if green > 100, else `Red`
//! 6. otherwise (channel ties) → `Mixed`

use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ColorSignature;
use crate::constants::color::{DARK_BRIGHTNESS, LIGHT_BRIGHTNESS, YELLOW_GREEN_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorGroup {
    Light,
    Dark,
    Blue,
    Green,
    #[serde(rename = "Yellow/Orange")]
    YellowOrange,
    Red,
    Mixed,
}

impl ColorGroup {
    /// Bucket a signature
    pub fn classify(sig: ColorSignature) -> Self {
        let brightness = sig.brightness();
        if brightness > LIGHT_BRIGHTNESS {
            return ColorGroup::Light;
        }
        if brightness < DARK_BRIGHTNESS {
            return ColorGroup::Dark;
        }

        let ColorSignature { r, g, b } = sig;
        if b > r && b > g {
            ColorGroup::Blue
        } else if g > r && g > b {
            ColorGroup::Green
        } else if r > g && r > b {
            if g > YELLOW_GREEN_LEVEL {
                ColorGroup::YellowOrange
            } else {
                ColorGroup::Red
            }
        } else {
            ColorGroup::Mixed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorGroup::Light => "Light",
            ColorGroup::Dark => "Dark",
            ColorGroup::Blue => "Blue",
            ColorGroup::Green => "Green",
            ColorGroup::YellowOrange => "Yellow/Orange",
            ColorGroup::Red => "Red",
            ColorGroup::Mixed => "Mixed",
        }
    }

    /// Swatch color used when displaying the group
    pub fn display_color(&self) -> Srgb<u8> {
        match self {
            ColorGroup::Light => Srgb::new(0xf8, 0xf9, 0xfa),
            ColorGroup::Dark => Srgb::new(0x34, 0x3a, 0x40),
            ColorGroup::Blue => Srgb::new(0x00, 0x7b, 0xff),
            ColorGroup::Green => Srgb::new(0x28, 0xa7, 0x45),
            ColorGroup::YellowOrange => Srgb::new(0xff, 0xc1, 0x07),
            ColorGroup::Red => Srgb::new(0xdc, 0x35, 0x45),
            ColorGroup::Mixed => Srgb::new(0x6c, 0x75, 0x7d),
        }
    }

    /// Display color as `#rrggbb`
    pub fn hex(&self) -> String {
        let c = self.display_color();
        format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
    }
}

impl fmt::Display for ColorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(r: u8, g: u8, b: u8) -> ColorGroup {
        ColorGroup::classify(ColorSignature::new(r, g, b))
    }

    #[test]
    fn test_brightness_buckets() {
        assert_eq!(classify(255, 255, 255), ColorGroup::Light);
        assert_eq!(classify(0, 0, 0), ColorGroup::Dark);
    }

    #[test]
    fn test_brightness_boundaries_are_exclusive() {
        // exactly 200 is not Light; gray ties fall through to Mixed
        assert_eq!(classify(200, 200, 200), ColorGroup::Mixed);
        assert_eq!(classify(202, 199, 199), ColorGroup::YellowOrange);
        assert_eq!(classify(201, 200, 200), ColorGroup::Light);

        // exactly 60 is not Dark
        assert_eq!(classify(60, 60, 60), ColorGroup::Mixed);
        assert_eq!(classify(61, 60, 59), ColorGroup::Red);
        assert_eq!(classify(59, 60, 60), ColorGroup::Dark);
        assert_eq!(classify(59, 59, 59), ColorGroup::Dark);
        assert_eq!(classify(20, 20, 140), ColorGroup::Blue);
        assert_eq!(classify(62, 59, 59), ColorGroup::Red);
    }

    #[test]
    fn test_hue_buckets() {
        assert_eq!(classify(30, 30, 200), ColorGroup::Blue);
        assert_eq!(classify(30, 200, 30), ColorGroup::Green);
        assert_eq!(classify(200, 30, 30), ColorGroup::Red);
        assert_eq!(classify(230, 150, 20), ColorGroup::YellowOrange);
        assert_eq!(classify(200, 100, 20), ColorGroup::Red);
    }

    #[test]
    fn test_channel_ties_are_mixed() {
        assert_eq!(classify(150, 150, 40), ColorGroup::Mixed);
        assert_eq!(classify(40, 150, 150), ColorGroup::Mixed);
        assert_eq!(classify(150, 40, 150), ColorGroup::Mixed);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let sig = ColorSignature::new(123, 45, 67);
        let first = ColorGroup::classify(sig);
        for _ in 0..10 {
            assert_eq!(ColorGroup::classify(sig), first);
        }
    }

    #[test]
    fn test_display_metadata() {
        assert_eq!(ColorGroup::YellowOrange.label(), "Yellow/Orange");
        assert_eq!(ColorGroup::Red.hex(), "#dc3545");
        assert_eq!(ColorGroup::Light.to_string(), "Light");
        assert_eq!(
            serde_json::to_string(&ColorGroup::YellowOrange).unwrap(),
            "\"Yellow/Orange\""
        );
    }
}
