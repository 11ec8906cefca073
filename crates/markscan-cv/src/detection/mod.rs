//! Detector families built on the pipeline stages

pub mod arrow;
pub mod blob;
pub mod config;
pub mod health;
pub mod report;
pub mod shapes;
pub mod template;

pub use arrow::{ArrowDetector, ArrowParams};
pub use blob::{BlobDetector, BlobParams};
pub use config::DetectionConfig;
pub use health::{HealthBarDetector, HealthBarParams};
pub use report::{DetectionReport, DetectionStats};
pub use shapes::{ShapeDetector, ShapeDetectorParams, ShapeSource};
pub use template::{TemplateDetector, TemplateParams};
