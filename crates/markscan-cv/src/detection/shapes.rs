//! Generic outlines classified by vertex count

use super::report::DetectionReport;
use crate::error::ensure_image;
use crate::extract::{extract, ExtractOptions};
use crate::segment::{segment, ColorRange, Mask, SegmentParams};
use crate::shape::{describe, ShapeParams};
use crate::traits::Detector;
use crate::Result;
use image::{imageops, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use markscan_core::DetectionEntry;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Where outlines come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeSource {
    /// Canny edges of the blurred grayscale image
    Edges { low: f32, high: f32 },
    /// Regions of one color
    Color { color: ColorRange, segment: SegmentParams },
}

impl Default for ShapeSource {
    fn default() -> Self {
        ShapeSource::Edges { low: 50.0, high: 150.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDetectorParams {
    pub source: ShapeSource,
    /// Grayscale blur before edge detection; `<= 0` disables it
    pub blur_sigma: f32,
    pub extract: ExtractOptions,
    pub shape: ShapeParams,
}

impl Default for ShapeDetectorParams {
    fn default() -> Self {
        Self {
            source: ShapeSource::default(),
            blur_sigma: 1.1,
            extract: ExtractOptions {
                max_area: 5000.0,
                ..ExtractOptions::shapes()
            },
            shape: ShapeParams::default(),
        }
    }
}

impl ShapeDetectorParams {
    /// Shapes of a single color instead of edges
    pub fn color(color: ColorRange) -> Self {
        Self {
            source: ShapeSource::Color {
                color,
                segment: SegmentParams::raw(),
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeDetector {
    params: ShapeDetectorParams,
}

impl ShapeDetector {
    pub fn new(params: ShapeDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ShapeDetectorParams {
        &self.params
    }

    /// Binary outline source for `image`
    pub fn mask(&self, image: &RgbImage) -> Mask {
        match &self.params.source {
            ShapeSource::Edges { low, high } => {
                let mut gray = imageops::grayscale(image);
                if self.params.blur_sigma > 0.0 {
                    gray = gaussian_blur_f32(&gray, self.params.blur_sigma);
                }
                Mask::from_gray(&canny(&gray, *low, *high))
            }
            ShapeSource::Color { color, segment: params } => segment(image, color, params),
        }
    }
}

impl Detector for ShapeDetector {
    fn name(&self) -> &str {
        "shapes"
    }

    fn detect(&self, image: &RgbImage) -> Result<DetectionReport> {
        ensure_image(image.width(), image.height())?;
        let started = Instant::now();

        let mask = self.mask(image);
        let options = ExtractOptions {
            keep_boundary: true,
            ..self.params.extract.clone()
        };

        let entries: Vec<DetectionEntry> = extract(&mask, &options)
            .iter()
            .filter_map(|c| {
                let desc = describe(c, &self.params.shape)?;
                let mut entry = DetectionEntry::from_candidate(desc.kind.name(), c);
                entry.shape = Some(desc.kind);
                Some(entry)
            })
            .collect();

        debug!("shapes: {} outlines classified", entries.len());
        Ok(DetectionReport::new(self.name(), image.dimensions(), entries, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use markscan_core::ShapeKind;

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_color_shapes() {
        let orange = Rgb([255, 140, 0]);
        let mut img = RgbImage::from_pixel(100, 60, Rgb([10, 10, 10]));
        for y in 10..=40u32 {
            let half = (y - 10) * 20 / 30;
            for x in (30 - half)..=(30 + half) {
                img.put_pixel(x, y, orange);
            }
        }
        fill(&mut img, 70, 15, 20, 20, orange);
        fill(&mut img, 50, 48, 40, 8, orange);

        let report = ShapeDetector::new(ShapeDetectorParams::color(ColorRange::orange())).detect(&img).unwrap();
        let kinds: Vec<ShapeKind> = report.entries.iter().filter_map(|e| e.shape).collect();
        assert_eq!(kinds, vec![ShapeKind::Triangle, ShapeKind::Square, ShapeKind::Rectangle]);
        assert_eq!(report.entries[1].label, "Square");
    }

    #[test]
    fn test_edges_follow_outlines() {
        let mut img = RgbImage::from_pixel(80, 80, Rgb([0, 0, 0]));
        fill(&mut img, 25, 25, 30, 30, Rgb([255, 255, 255]));

        let report = ShapeDetector::default().detect(&img).unwrap();
        assert!(!report.is_empty());
        for entry in &report.entries {
            let p = entry.position;
            assert!((20..=60).contains(&p.x) && (20..=60).contains(&p.y));
        }
    }
}
