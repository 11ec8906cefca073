//! Color segmentation: HSV thresholding followed by morphological cleanup

pub mod hsv;
pub mod mask;
pub mod morphology;

pub use hsv::{rgb_to_hsv, ColorRange, HsvRange};
pub use mask::Mask;

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Cleanup applied around the color threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Gaussian sigma applied to the color image first; `<= 0` disables it
    pub blur_sigma: f32,
    pub open_radius: u32,
    pub open_iterations: u32,
    pub close_radius: u32,
    pub close_iterations: u32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            blur_sigma: 0.0,
            open_radius: 1,
            open_iterations: 1,
            close_radius: 2,
            close_iterations: 1,
        }
    }
}

impl SegmentParams {
    /// Threshold only, no blur and no morphology
    pub fn raw() -> Self {
        Self {
            blur_sigma: 0.0,
            open_radius: 0,
            open_iterations: 0,
            close_radius: 0,
            close_iterations: 0,
        }
    }

    /// Map markers: a light blur to steady small dots
    pub fn map_points() -> Self {
        Self {
            blur_sigma: 1.1,
            ..Default::default()
        }
    }
}

/// Pixels whose HSV value falls inside any range of `color`
pub fn threshold(image: &RgbImage, color: &ColorRange) -> Mask {
    Mask::from_fn(image.width(), image.height(), |x, y| color.contains_rgb(image.get_pixel(x, y).0))
}

/// Threshold, open, then close.
pub fn segment(image: &RgbImage, color: &ColorRange, params: &SegmentParams) -> Mask {
    let blurred;
    let source = if params.blur_sigma > 0.0 {
        blurred = imageproc::filter::gaussian_blur_f32(image, params.blur_sigma);
        &blurred
    } else {
        image
    };

    let raw = threshold(source, color);
    let opened = morphology::open(&raw, params.open_radius, params.open_iterations);
    let cleaned = morphology::close(&opened, params.close_radius, params.close_iterations);

    debug!(
        "segment '{}': {} raw, {} after cleanup",
        color.name,
        raw.count(),
        cleaned.count()
    );

    cleaned
}

/// Union of the segmented masks of several colors
pub fn segment_any(image: &RgbImage, colors: &[ColorRange], params: &SegmentParams) -> Mask {
    let mut mask = Mask::new(image.width(), image.height());
    for color in colors {
        mask.union_with(&segment(image, color, params));
    }
    mask
}
