//! Player arrow: position plus heading

use super::report::DetectionReport;
use crate::error::ensure_image;
use crate::extract::{extract, ExtractOptions};
use crate::orientation::{estimate, OrientationParams};
use crate::segment::{segment, ColorRange, SegmentParams};
use crate::traits::Detector;
use crate::Result;
use image::RgbImage;
use log::debug;
use markscan_core::{Candidate, DetectionEntry};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowParams {
    pub color: ColorRange,
    pub segment: SegmentParams,
    pub extract: ExtractOptions,
    pub orientation: OrientationParams,
    /// Area at which confidence saturates at 1
    pub full_confidence_area: f64,
    /// Drop candidates whose heading cannot be estimated
    pub require_heading: bool,
    /// Keep only the largest arrows; `None` keeps all
    pub max_results: Option<usize>,
}

impl Default for ArrowParams {
    fn default() -> Self {
        Self {
            color: ColorRange::white_arrow(),
            segment: SegmentParams {
                blur_sigma: 0.0,
                open_radius: 2,
                open_iterations: 1,
                close_radius: 3,
                close_iterations: 1,
            },
            extract: ExtractOptions::arrows(),
            orientation: OrientationParams::default(),
            full_confidence_area: 2000.0,
            require_heading: true,
            max_results: Some(1),
        }
    }
}

impl ArrowParams {
    pub fn confidence(&self, area: f64) -> f64 {
        if self.full_confidence_area > 0.0 {
            (area / self.full_confidence_area).min(1.0)
        } else {
            1.0
        }
    }
}

/// Finds bright arrow shapes and estimates where they point
#[derive(Debug, Clone, Default)]
pub struct ArrowDetector {
    params: ArrowParams,
}

impl ArrowDetector {
    pub fn new(params: ArrowParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ArrowParams {
        &self.params
    }

    fn entry(&self, candidate: &Candidate) -> Option<DetectionEntry> {
        let boundary = candidate.boundary.as_deref().unwrap_or_default();
        let heading = estimate(boundary, &self.params.orientation);
        if heading.is_none() && self.params.require_heading {
            return None;
        }

        let mut entry = DetectionEntry::from_candidate(&self.params.color.name, candidate);
        entry.score = Some(self.params.confidence(candidate.area));
        entry.heading = heading;
        Some(entry)
    }
}

impl Detector for ArrowDetector {
    fn name(&self) -> &str {
        "arrow"
    }

    fn detect(&self, image: &RgbImage) -> Result<DetectionReport> {
        ensure_image(image.width(), image.height())?;
        let started = Instant::now();

        let mask = segment(image, &self.params.color, &self.params.segment);
        let extract_options = ExtractOptions {
            keep_boundary: true,
            ..self.params.extract.clone()
        };
        let mut candidates = extract(&mask, &extract_options);

        // largest first; stable so equal areas keep discovery order
        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));

        let mut entries: Vec<DetectionEntry> = candidates.iter().filter_map(|c| self.entry(c)).collect();
        if let Some(max) = self.params.max_results {
            entries.truncate(max);
        }

        debug!("arrow: {} candidates -> {} arrows", candidates.len(), entries.len());
        Ok(DetectionReport::new(self.name(), image.dimensions(), entries, started))
    }
}
