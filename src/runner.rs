//! Runs one detector over one image file

use anyhow::{bail, Context};
use clap::ValueEnum;
use log::info;
use markscan_cv::detection::{
    ArrowDetector, BlobDetector, DetectionConfig, DetectionReport, HealthBarDetector, ShapeDetector, TemplateDetector,
};
use markscan_cv::traits::Detector;
use markscan_cv::Result;
use std::fs;
use std::path::Path;

/// Detector families selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectorKind {
    /// Orange, red and yellow map points
    Points,
    /// Yellow monster dots
    Monsters,
    /// Player arrow with heading
    Arrow,
    /// Health bars with fill ratio
    HealthBars,
    /// Outlines classified by vertex count
    Shapes,
    /// A template image, optionally scaled and rotated
    Template,
}

/// Parsed config file, or the defaults without one
pub fn load_config(path: Option<&Path>) -> Result<DetectionConfig> {
    let Some(path) = path else {
        return Ok(DetectionConfig::new());
    };
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    DetectionConfig::from_json(&json).with_context(|| format!("Invalid config: {:?}", path))
}

pub fn build_detector(kind: DetectorKind, config: &DetectionConfig, template: Option<&Path>) -> Result<Box<dyn Detector>> {
    let detector: Box<dyn Detector> = match kind {
        DetectorKind::Points => Box::new(BlobDetector::new(config.blobs.clone())),
        DetectorKind::Monsters => Box::new(BlobDetector::new(config.monsters.clone())),
        DetectorKind::Arrow => Box::new(ArrowDetector::new(config.arrow.clone())),
        DetectorKind::HealthBars => Box::new(HealthBarDetector::new(config.health_bar.clone())),
        DetectorKind::Shapes => Box::new(ShapeDetector::new(config.shape.clone())),
        DetectorKind::Template => {
            let Some(path) = template else {
                bail!("the template detector needs --template");
            };
            let image = image::open(path)
                .with_context(|| format!("Failed to load template: {:?}", path))?
                .to_luma8();
            Box::new(TemplateDetector::new(image, config.template.clone()))
        }
    };
    Ok(detector)
}

/// Loads `image_path` and runs the detector on it
pub fn run(detector: &dyn Detector, image_path: &Path) -> Result<DetectionReport> {
    let image = image::open(image_path)
        .with_context(|| format!("Failed to load image: {:?}", image_path))?
        .to_rgb8();

    let report = detector.detect(&image)?;
    info!(
        "{}: {} detections in {} ms{}",
        detector.name(),
        report.stats.total_detections,
        report.stats.processing_time_ms,
        if report.stats.timed_out { " (timed out)" } else { "" }
    );
    Ok(report)
}
