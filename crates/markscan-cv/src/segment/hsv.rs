//! 8-bit HSV: hue in `0..180` (half degrees), saturation and value in `0..=255`.

use serde::{Deserialize, Serialize};

/// Converts one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { (255.0 * diff / max).round() } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let h = (h / 2.0).round();

    [if h >= 180.0 { 0 } else { h as u8 }, s as u8, max as u8]
}

/// Inclusive bounds on the three HSV channels.
///
/// A hue range with `h_min > h_max` wraps through 0, so `170..=10` selects
/// reds on both ends of the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            h_min: lower[0],
            h_max: upper[0],
            s_min: lower[1],
            s_max: upper[1],
            v_min: lower[2],
            v_max: upper[2],
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv;
        let hue_ok = if self.h_min <= self.h_max {
            h >= self.h_min && h <= self.h_max
        } else {
            h >= self.h_min || h <= self.h_max
        };
        hue_ok && within(s, self.s_min, self.s_max) && within(v, self.v_min, self.v_max)
    }
}

// Saturation and value bounds entered the wrong way round are swapped.
fn within(value: u8, a: u8, b: u8) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

/// A named color made of one or more HSV ranges whose masks are ORed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub name: String,
    pub ranges: Vec<HsvRange>,
}

impl ColorRange {
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }

    pub fn single(name: impl Into<String>, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self::new(name, vec![HsvRange::new(lower, upper)])
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.ranges.iter().any(|range| range.contains(hsv))
    }

    pub fn contains_rgb(&self, rgb: [u8; 3]) -> bool {
        self.contains(rgb_to_hsv(rgb[0], rgb[1], rgb[2]))
    }

    /// Map point orange
    pub fn orange() -> Self {
        Self::single("orange", [10, 100, 100], [25, 255, 255])
    }

    /// Red wraps around hue 0 and needs two ranges
    pub fn red() -> Self {
        Self::new(
            "red",
            vec![
                HsvRange::new([0, 100, 100], [10, 255, 255]),
                HsvRange::new([170, 100, 100], [180, 255, 255]),
            ],
        )
    }

    pub fn yellow() -> Self {
        Self::single("yellow", [25, 100, 100], [35, 255, 255])
    }

    /// Slightly wider yellow used for monster markers
    pub fn monster_yellow() -> Self {
        Self::single("monster", [20, 100, 100], [35, 255, 255])
    }

    /// Yellow name plates of passive monsters
    pub fn passive_name() -> Self {
        Self::single("passive", [29, 50, 180], [31, 90, 255])
    }

    /// Red name plates of aggressive monsters
    pub fn aggressive_name() -> Self {
        Self::single("aggressive", [0, 200, 200], [5, 255, 255])
    }

    /// Bright, unsaturated player arrow
    pub fn white_arrow() -> Self {
        Self::single("arrow", [0, 0, 150], [180, 50, 255])
    }

    /// Health bar green
    pub fn green() -> Self {
        Self::single("green", [35, 100, 100], [85, 255, 255])
    }
}
