//! Outline classification by simplified vertex count

use markscan_core::geometry::{approx_polygon, arc_length, bounding_rect};
use markscan_core::{Candidate, Point, ShapeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    /// Simplification tolerance as a share of the outline length
    pub epsilon_factor: f64,
    /// Four-sided outlines whose width/height stays within `1 ± this` are squares
    pub square_tolerance: f64,
    /// Outlines with many vertices are circles above this circularity
    pub circle_threshold: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            epsilon_factor: 0.04,
            square_tolerance: 0.05,
            circle_threshold: 0.8,
        }
    }
}

/// Classified outline with the corners that decided it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescription {
    pub kind: ShapeKind,
    pub vertices: Vec<Point>,
}

/// Douglas-Peucker simplification with `epsilon = factor * outline length`
pub fn simplify(boundary: &[Point], epsilon_factor: f64) -> Vec<Point> {
    let epsilon = epsilon_factor.max(0.0) * arc_length(boundary, true);
    approx_polygon(boundary, epsilon)
}

/// Maps a simplified vertex count to a shape class
pub fn classify(vertex_count: usize, aspect_ratio: f64, circularity: f64, params: &ShapeParams) -> ShapeKind {
    match vertex_count {
        3 => ShapeKind::Triangle,
        4 if (aspect_ratio - 1.0).abs() <= params.square_tolerance => ShapeKind::Square,
        4 => ShapeKind::Rectangle,
        5 => ShapeKind::Pentagon,
        6..=11 => ShapeKind::Polygon(vertex_count),
        _ if circularity > params.circle_threshold => ShapeKind::Circle,
        _ => ShapeKind::Blob,
    }
}

/// Simplifies and classifies a candidate's outline; `None` without a boundary
pub fn describe(candidate: &Candidate, params: &ShapeParams) -> Option<ShapeDescription> {
    let boundary = candidate.boundary.as_deref()?;
    let vertices = simplify(boundary, params.epsilon_factor);
    let aspect = bounding_rect(&vertices).map(|r| r.aspect_ratio()).unwrap_or(0.0);
    let kind = classify(vertices.len(), aspect, candidate.circularity, params);
    Some(ShapeDescription { kind, vertices })
}
