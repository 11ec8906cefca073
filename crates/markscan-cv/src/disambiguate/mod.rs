//! Disambiguation of raw detections: proximity merge for points, greedy
//! suppression for scored boxes.

pub mod merge;
pub mod nms;

pub use merge::{merge, seed_clusters, Cluster};
pub use nms::{sort_by_score, suppress, suppress_by_distance};
