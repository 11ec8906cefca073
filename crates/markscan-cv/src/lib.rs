//! Markscan Computer Vision Library
//!
//! Geometric detection of markers in game-map screenshots: color
//! segmentation, region extraction, disambiguation, template search and
//! heading estimation.

pub mod detection;
pub mod disambiguate;
pub mod error;
pub mod extract;
pub mod orientation;
pub mod segment;
pub mod shape;
pub mod template;

// Re-export commonly used types
pub use detection::{
    ArrowDetector, BlobDetector, DetectionConfig, DetectionReport, DetectionStats, HealthBarDetector, ShapeDetector,
    TemplateDetector,
};
pub use error::InputError;
pub use extract::{extract, ExtractOptions};
pub use orientation::{estimate, OrientationParams};
pub use segment::{segment, ColorRange, Mask, SegmentParams};
pub use template::{MatchMetric, SearchOutcome, SearchParams, TemplateSearcher};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use image::RgbImage;

    /// A detector family: one frame in, one report out
    pub trait Detector {
        fn name(&self) -> &str;
        fn detect(&self, image: &RgbImage) -> Result<DetectionReport>;
    }
}
