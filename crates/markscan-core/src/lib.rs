//! Geometry and record types for locating small markers in game map screenshots.
//!
//! Everything here is pure value computation; image handling lives in `markscan-cv`.

pub mod geometry;
pub mod heading;
pub mod records;

pub use geometry::{Point, PointF, Rect, RotatedRect};
pub use heading::{compass16, math_to_compass, normalize_degrees, vector_heading, Compass};
pub use records::{
    circularity, Candidate, DetectionEntry, OrientationEstimate, OrientationMethod, ShapeKind, TemplateMatch,
};
