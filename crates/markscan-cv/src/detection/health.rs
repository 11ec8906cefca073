//! Horizontal health bars and how full they are

use super::report::DetectionReport;
use crate::error::ensure_image;
use crate::extract::{extract, ExtractOptions};
use crate::segment::{segment, threshold, ColorRange, SegmentParams};
use crate::traits::Detector;
use crate::Result;
use image::RgbImage;
use log::debug;
use markscan_core::DetectionEntry;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthBarParams {
    pub color: ColorRange,
    pub segment: SegmentParams,
    pub extract: ExtractOptions,
}

impl Default for HealthBarParams {
    fn default() -> Self {
        Self {
            color: ColorRange::green(),
            segment: SegmentParams::default(),
            extract: ExtractOptions::health_bars(),
        }
    }
}

/// Reports each bar with the share of its box covered by the bar color
#[derive(Debug, Clone, Default)]
pub struct HealthBarDetector {
    params: HealthBarParams,
}

impl HealthBarDetector {
    pub fn new(params: HealthBarParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HealthBarParams {
        &self.params
    }
}

impl Detector for HealthBarDetector {
    fn name(&self) -> &str {
        "health_bars"
    }

    fn detect(&self, image: &RgbImage) -> Result<DetectionReport> {
        ensure_image(image.width(), image.height())?;
        let started = Instant::now();

        let cleaned = segment(image, &self.params.color, &self.params.segment);
        // fill is measured on the unfiltered threshold
        let raw = threshold(image, &self.params.color);

        let entries: Vec<DetectionEntry> = extract(&cleaned, &self.params.extract)
            .iter()
            .map(|c| {
                let box_area = c.bbox.area();
                let fill = if box_area > 0.0 { raw.count_in(&c.bbox) as f64 / box_area } else { 0.0 };
                let mut entry = DetectionEntry::from_candidate(&self.params.color.name, c);
                entry.fill_ratio = Some(fill.min(1.0));
                entry
            })
            .collect();

        debug!("health bars: {} found", entries.len());
        Ok(DetectionReport::new(self.name(), image.dimensions(), entries, started))
    }
}
