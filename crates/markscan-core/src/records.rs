//! Plain records handed between pipeline stages and returned to callers.

use crate::geometry::{Point, Rect};
use crate::heading::Compass;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// `4π·area / perimeter²`, clamped to 1.0.
///
/// `None` for a zero (or non-finite) perimeter, which marks a degenerate region.
pub fn circularity(area: f64, perimeter: f64) -> Option<f64> {
    if !(perimeter > 0.0) || !perimeter.is_finite() {
        return None;
    }
    Some((4.0 * PI * area / (perimeter * perimeter)).clamp(0.0, 1.0))
}

/// A connected foreground region found in a mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub centroid: Point,
    pub bbox: Rect,
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub aspect_ratio: f64,
    /// Ordered outer boundary, kept for shape and orientation analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Vec<Point>>,
}

impl Candidate {
    /// Builds a candidate from its measures; `None` when the perimeter is zero.
    pub fn new(centroid: Point, bbox: Rect, area: f64, perimeter: f64) -> Option<Self> {
        let circularity = circularity(area, perimeter)?;
        Some(Self {
            centroid,
            bbox,
            area,
            perimeter,
            circularity,
            aspect_ratio: bbox.aspect_ratio(),
            boundary: None,
        })
    }

    pub fn with_boundary(mut self, boundary: Vec<Point>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Radius of the circle with the same area
    pub fn equivalent_radius(&self) -> f64 {
        (self.area / PI).sqrt()
    }

    /// Same candidate positioned at another centroid
    pub fn moved_to(&self, centroid: Point) -> Self {
        Self { centroid, ..self.clone() }
    }

    /// Shifts centroid, box and boundary by `(dx, dy)`
    pub fn translated(mut self, dx: i32, dy: i32) -> Self {
        let shift = |p: Point| Point::new(p.x + dx, p.y + dy);
        self.centroid = shift(self.centroid);
        self.bbox = Rect::new(self.bbox.x + dx, self.bbox.y + dy, self.bbox.width, self.bbox.height);
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.iter_mut().for_each(|p| *p = shift(*p));
        }
        self
    }
}

/// A template placement that passed the score threshold.
///
/// `score` is always "higher is better", whatever the metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMatch {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Clockwise template rotation in degrees, 0 when no rotation was searched
    pub angle: f64,
    pub scale: f64,
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

impl TemplateMatch {
    pub fn new(x: i32, y: i32, width: i32, height: i32, score: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle: 0.0,
            scale: 1.0,
            score,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_transform(mut self, scale: f64, angle: f64) -> Self {
        self.scale = scale;
        self.angle = angle;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn iou(&self, other: &TemplateMatch) -> f64 {
        self.rect().iou(&other.rect())
    }
}

/// The three heading strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationMethod {
    /// Long axis of the minimum-area rectangle; cannot tell tip from tail
    BoundingBox,
    /// Sharpest convex hull vertex, seen from the centroid
    ConvexHullTip,
    /// Principal axis of the boundary points; cannot tell tip from tail
    Pca,
}

impl OrientationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationMethod::BoundingBox => "MinAreaRect",
            OrientationMethod::ConvexHullTip => "ConvexHull",
            OrientationMethod::Pca => "PCA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationEstimate {
    /// Compass degrees in `[0, 360)`
    pub angle: f64,
    pub compass: Compass,
    pub method: OrientationMethod,
    /// Set by the axis strategies: the heading may equally be `alternate_angle`
    pub ambiguous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_angle: Option<f64>,
    /// The hull strategy found no sharp tip and used the furthest hull point
    #[serde(default)]
    pub used_fallback: bool,
}

/// Outline classes assigned by the shape detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Triangle,
    Square,
    Rectangle,
    Pentagon,
    /// Six to eleven vertices
    Polygon(usize),
    Circle,
    /// Anything else
    Blob,
}

impl ShapeKind {
    pub fn name(&self) -> String {
        match self {
            ShapeKind::Triangle => "Triangle".to_string(),
            ShapeKind::Square => "Square".to_string(),
            ShapeKind::Rectangle => "Rectangle".to_string(),
            ShapeKind::Pentagon => "Pentagon".to_string(),
            ShapeKind::Polygon(n) => format!("{}-gon", n),
            ShapeKind::Circle => "Circle".to_string(),
            ShapeKind::Blob => "Blob".to_string(),
        }
    }
}

/// One row of a detection report. `id` is the 1-based rank within its run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionEntry {
    pub id: usize,
    pub label: String,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<OrientationEstimate>,
    /// Compass heading implied by the rotation of a matched template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
    /// Share of the bounding box covered by foreground
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_ratio: Option<f64>,
}

impl DetectionEntry {
    pub fn at(label: impl Into<String>, position: Point) -> Self {
        Self {
            label: label.into(),
            position,
            ..Default::default()
        }
    }

    /// Entry carrying the geometric attributes of a candidate
    pub fn from_candidate(label: impl Into<String>, candidate: &Candidate) -> Self {
        Self {
            label: label.into(),
            position: candidate.centroid,
            bbox: Some(candidate.bbox),
            area: Some(candidate.area),
            circularity: Some(candidate.circularity),
            aspect_ratio: Some(candidate.aspect_ratio),
            ..Default::default()
        }
    }

    /// Entry for a template match, positioned at the match centre
    pub fn from_match(m: &TemplateMatch) -> Self {
        Self {
            label: m.label.clone(),
            position: m.center(),
            bbox: Some(m.rect()),
            score: Some(m.score),
            scale: Some(m.scale),
            ..Default::default()
        }
    }

    pub fn with_heading(mut self, heading: OrientationEstimate) -> Self {
        self.heading = Some(heading);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circularity_rejects_zero_perimeter() {
        assert_eq!(circularity(10.0, 0.0), None);
        assert_eq!(circularity(10.0, f64::NAN), None);
        // pixel areas can exceed the outline estimate; clamp
        assert_eq!(circularity(100.0, 30.0), Some(1.0));
        assert_relative_eq!(circularity(16.0, 16.0).unwrap(), PI / 4.0);
    }

    #[test]
    fn test_candidate_measures() {
        let c = Candidate::new(Point::new(5, 5), Rect::new(0, 0, 20, 10), 200.0, 60.0).unwrap();
        assert_relative_eq!(c.aspect_ratio, 2.0);
        assert_relative_eq!(c.equivalent_radius(), (200.0 / PI).sqrt());
        assert!(Candidate::new(Point::new(0, 0), Rect::new(0, 0, 1, 1), 1.0, 0.0).is_none());
    }

    #[test]
    fn test_candidate_translated() {
        let c = Candidate::new(Point::new(5, 5), Rect::new(2, 3, 6, 4), 20.0, 20.0)
            .unwrap()
            .with_boundary(vec![Point::new(2, 3), Point::new(7, 6)])
            .translated(100, -3);
        assert_eq!(c.centroid, Point::new(105, 2));
        assert_eq!(c.bbox, Rect::new(102, 0, 6, 4));
        assert_eq!(c.boundary.unwrap(), vec![Point::new(102, 0), Point::new(107, 3)]);
        assert_relative_eq!(c.area, 20.0);
    }

    #[test]
    fn test_shape_names_are_distinct() {
        assert_eq!(ShapeKind::Blob.name(), "Blob");
        assert_eq!(ShapeKind::Polygon(6).name(), "6-gon");
        assert_ne!(ShapeKind::Blob.name(), ShapeKind::Polygon(8).name());
    }

    #[test]
    fn test_match_center() {
        let m = TemplateMatch::new(10, 20, 9, 6, 0.9);
        assert_eq!(m.center(), Point::new(14, 23));
    }
}
