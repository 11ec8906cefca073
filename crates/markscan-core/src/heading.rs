//! Compass headings: degrees from north, increasing clockwise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wraps any angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Converts a standard math angle (0 = east, counter-clockwise, y up) to a
/// compass angle (0 = north, clockwise): `(90 - math) mod 360`.
pub fn math_to_compass(math_degrees: f64) -> f64 {
    normalize_degrees(90.0 - math_degrees)
}

/// Compass heading of an image-space vector. Image rows grow downwards, so
/// the y component is flipped before taking the math angle.
pub fn vector_heading(dx: f64, dy: f64) -> Option<f64> {
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(math_to_compass((-dy).atan2(dx).to_degrees()))
}

/// The eight principal compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    pub const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    /// Sector `floor((angle + 22.5) / 45) mod 8`, each 45 degrees wide and
    /// centred on its direction.
    pub fn from_degrees(angle: f64) -> Self {
        let angle = normalize_degrees(angle);
        let sector = ((angle + 22.5) / 45.0).floor() as usize % 8;
        Self::ALL[sector]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NE => "NE",
            Compass::E => "E",
            Compass::SE => "SE",
            Compass::S => "S",
            Compass::SW => "SW",
            Compass::W => "W",
            Compass::NW => "NW",
        }
    }

    /// Centre angle of the sector
    pub fn degrees(&self) -> f64 {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0) as f64 * 45.0
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const COMPASS16: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

/// Sixteen-point compass label, 22.5 degree sectors centred on each direction.
pub fn compass16(angle: f64) -> &'static str {
    let angle = normalize_degrees(angle);
    COMPASS16[((angle + 11.25) / 22.5).floor() as usize % 16]
}
