//! Heading of a single candidate from its boundary points.
//!
//! Headings are compass degrees: 0 is straight up the screen, growing
//! clockwise. The two axis strategies (minimum-area rectangle and principal
//! axis) only see a line, not a direction, so their estimates are flagged
//! `ambiguous` and carry the opposite heading in `alternate_angle`.

use log::trace;
use markscan_core::geometry::{centroid, convex_hull, hull_interior_angles, mean_point, min_area_rect};
use markscan_core::{normalize_degrees, vector_heading, Compass, OrientationEstimate, OrientationMethod, Point, PointF};
use serde::{Deserialize, Serialize};

/// Fewest boundary points any strategy accepts
pub const MIN_BOUNDARY_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationParams {
    pub method: OrientationMethod,
    /// A hull vertex sharper than this (degrees) counts as the tip
    pub tip_angle_threshold: f64,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            method: OrientationMethod::ConvexHullTip,
            tip_angle_threshold: 120.0,
        }
    }
}

impl OrientationParams {
    pub fn with_method(method: OrientationMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }
}

fn directed(angle: f64, method: OrientationMethod, used_fallback: bool) -> OrientationEstimate {
    let angle = normalize_degrees(angle);
    OrientationEstimate {
        angle,
        compass: Compass::from_degrees(angle),
        method,
        ambiguous: false,
        alternate_angle: None,
        used_fallback,
    }
}

/// Folds an axis heading into `[0, 180)` and records the opposite end
fn axial(angle: f64, method: OrientationMethod) -> OrientationEstimate {
    let mut angle = normalize_degrees(angle) % 180.0;
    if angle >= 180.0 - 1e-9 {
        angle = 0.0;
    }
    OrientationEstimate {
        angle,
        compass: Compass::from_degrees(angle),
        method,
        ambiguous: true,
        alternate_angle: Some(angle + 180.0),
        used_fallback: false,
    }
}

fn heading_from(origin: PointF, target: PointF) -> Option<f64> {
    vector_heading(target.x - origin.x, target.y - origin.y)
}

/// Long-axis heading of the minimum-area enclosing rectangle
pub fn bounding_box_heading(boundary: &[Point]) -> Option<OrientationEstimate> {
    if boundary.len() < MIN_BOUNDARY_POINTS {
        return None;
    }
    let rect = min_area_rect(boundary)?;
    if rect.long_side <= 0.0 {
        return None;
    }
    let (ux, uy) = rect.long_axis();
    let heading = vector_heading(ux, uy)?;
    Some(axial(heading, OrientationMethod::BoundingBox))
}

/// Heading from the centroid to the boundary point furthest from it.
/// The first of equally distant points wins.
pub fn furthest_point_heading(boundary: &[Point]) -> Option<f64> {
    let center = centroid(boundary)?;
    let mut best: Option<(f64, Point)> = None;
    for &p in boundary {
        let d = p.to_f64().distance(&center);
        if best.is_none_or(|(bd, _)| d > bd) {
            best = Some((d, p));
        }
    }
    let (_, tip) = best?;
    heading_from(center, tip.to_f64())
}

/// Heading from the centroid to the sharpest convex hull vertex.
///
/// When no vertex is sharper than `tip_angle_threshold`, or the hull is too
/// small to have corners, the furthest boundary point is used instead and
/// `used_fallback` is set.
pub fn hull_tip_heading(boundary: &[Point], tip_angle_threshold: f64) -> Option<OrientationEstimate> {
    if boundary.len() < MIN_BOUNDARY_POINTS {
        return None;
    }
    let center = centroid(boundary)?;
    let hull = convex_hull(boundary);

    let sharpest = hull_interior_angles(&hull)
        .into_iter()
        .enumerate()
        .filter_map(|(i, a)| a.map(|a| (i, a)))
        .fold(None, |best: Option<(usize, f64)>, (i, a)| match best {
            Some((_, ba)) if ba <= a => best,
            _ => Some((i, a)),
        });

    if let Some((i, angle)) = sharpest {
        if angle < tip_angle_threshold {
            if let Some(heading) = heading_from(center, hull[i].to_f64()) {
                return Some(directed(heading, OrientationMethod::ConvexHullTip, false));
            }
        } else {
            trace!("sharpest hull vertex {:.1} deg, using furthest point", angle);
        }
    }

    furthest_point_heading(boundary).map(|h| directed(h, OrientationMethod::ConvexHullTip, true))
}

/// Principal axis of the boundary points.
///
/// `None` when the spread is isotropic and no axis stands out.
pub fn pca_heading(boundary: &[Point]) -> Option<OrientationEstimate> {
    if boundary.len() < MIN_BOUNDARY_POINTS {
        return None;
    }
    let mean = mean_point(boundary)?;
    let n = boundary.len() as f64;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in boundary {
        let (dx, dy) = (p.x as f64 - mean.x, p.y as f64 - mean.y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let (a, b, c) = (sxx / n, sxy / n, syy / n);

    let spread = (a - c).hypot(2.0 * b);
    if spread <= 1e-9 * (a + c).max(1.0) {
        return None;
    }

    // major eigenvector angle, image coordinates
    let theta = 0.5 * (2.0 * b).atan2(a - c);
    let heading = vector_heading(theta.cos(), theta.sin())?;
    Some(axial(heading, OrientationMethod::Pca))
}

/// Estimates a heading with the strategy named in `params`.
///
/// `None` means the orientation is unknown for this boundary: too few
/// points, or nothing but zero-length vectors to work with.
pub fn estimate(boundary: &[Point], params: &OrientationParams) -> Option<OrientationEstimate> {
    match params.method {
        OrientationMethod::BoundingBox => bounding_box_heading(boundary),
        OrientationMethod::ConvexHullTip => hull_tip_heading(boundary, params.tip_angle_threshold),
        OrientationMethod::Pca => pca_heading(boundary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    /// Rectangle outline, one point per unit step
    fn outline(w: i32, h: i32) -> Vec<Point> {
        let mut out = Vec::new();
        for x in 0..w {
            out.push(Point::new(x, 0));
        }
        for y in 0..h {
            out.push(Point::new(w, y));
        }
        for x in (1..=w).rev() {
            out.push(Point::new(x, h));
        }
        for y in (1..=h).rev() {
            out.push(Point::new(0, y));
        }
        out
    }

    #[test]
    fn test_hull_tip_points_at_apex() {
        let up = pts(&[(10, 0), (0, 20), (20, 20)]);
        let est = hull_tip_heading(&up, 120.0).unwrap();
        assert_relative_eq!(est.angle, 0.0, epsilon = 1e-9);
        assert_eq!(est.compass, Compass::N);
        assert!(!est.ambiguous);
        assert!(!est.used_fallback);

        let east = pts(&[(0, 0), (20, 10), (0, 20)]);
        let est = hull_tip_heading(&east, 120.0).unwrap();
        assert_relative_eq!(est.angle, 90.0, epsilon = 1e-9);
        assert_eq!(est.compass, Compass::E);

        let south_west = pts(&[(0, 20), (6, 0), (20, 14)]);
        let est = hull_tip_heading(&south_west, 120.0).unwrap();
        assert_eq!(est.compass, Compass::SW);
    }

    #[test]
    fn test_hull_tip_fallback_to_furthest_point() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        // every corner is 90 degrees, not sharper than 60
        let est = hull_tip_heading(&square, 60.0).unwrap();
        assert!(est.used_fallback);
        // corners tie on distance, the first one wins
        assert_relative_eq!(est.angle, 315.0, epsilon = 1e-9);
        assert_eq!(est.compass, Compass::NW);
    }

    #[test]
    fn test_axis_strategies_are_ambiguous() {
        let bar = outline(20, 4);

        let rect = bounding_box_heading(&bar).unwrap();
        assert_relative_eq!(rect.angle, 90.0, epsilon = 1e-9);
        assert_eq!(rect.alternate_angle, Some(270.0));
        assert!(rect.ambiguous);
        assert_eq!(rect.method, OrientationMethod::BoundingBox);

        let pca = pca_heading(&bar).unwrap();
        assert_relative_eq!(pca.angle, 90.0, epsilon = 1e-9);
        assert!(pca.ambiguous);

        let column = outline(4, 20);
        assert_relative_eq!(pca_heading(&column).unwrap().angle, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bounding_box_heading(&column).unwrap().angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pca_diagonal() {
        // runs down and to the right on screen
        let line = pts(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        let est = pca_heading(&line).unwrap();
        assert_relative_eq!(est.angle, 135.0, epsilon = 1e-9);
        assert_relative_eq!(est.alternate_angle.unwrap(), 315.0, epsilon = 1e-9);
        assert_eq!(est.compass, Compass::SE);
    }

    #[test]
    fn test_isotropic_pca_is_unknown() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert!(pca_heading(&square).is_none());
    }

    #[test]
    fn test_too_few_points() {
        let two = pts(&[(0, 0), (5, 5)]);
        for method in [OrientationMethod::BoundingBox, OrientationMethod::ConvexHullTip, OrientationMethod::Pca] {
            let params = OrientationParams::with_method(method);
            assert!(estimate(&[], &params).is_none());
            assert!(estimate(&two, &params).is_none());
        }
    }

    #[test]
    fn test_coincident_points_are_degenerate() {
        let same = pts(&[(3, 3), (3, 3), (3, 3)]);
        for method in [OrientationMethod::BoundingBox, OrientationMethod::ConvexHullTip, OrientationMethod::Pca] {
            assert!(estimate(&same, &OrientationParams::with_method(method)).is_none());
        }
    }

    #[test]
    fn test_estimate_follows_params() {
        let up = pts(&[(10, 0), (5, 30), (15, 30)]);

        let hull = estimate(&up, &OrientationParams::default()).unwrap();
        assert_eq!(hull.method, OrientationMethod::ConvexHullTip);
        assert!(!hull.ambiguous);

        let rect = estimate(&up, &OrientationParams::with_method(OrientationMethod::BoundingBox)).unwrap();
        assert_eq!(rect.method, OrientationMethod::BoundingBox);
        assert!(rect.ambiguous);

        // a threshold below every hull angle forces the fallback
        let strict = OrientationParams {
            tip_angle_threshold: 10.0,
            ..OrientationParams::default()
        };
        assert!(estimate(&up, &strict).unwrap().used_fallback);
    }
}
