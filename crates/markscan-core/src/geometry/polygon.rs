//! Measures over ordered boundary polygons.
//!
//! Boundaries are closed: the last point connects back to the first.

use super::{Point, PointF, Rect};

/// Signed shoelace area. Positive when the points run clockwise on screen
/// (counter-clockwise in y-up coordinates).
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }

    twice as f64 / 2.0
}

/// Unsigned shoelace area of a closed polygon
pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Length of the polyline through `points`, including the closing edge when `closed`
pub fn arc_length(points: &[Point], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut length: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
    if closed {
        length += points[points.len() - 1].distance(&points[0]);
    }
    length
}

/// Perimeter of a traced pixel boundary, measured along the polygon through
/// the midpoints of consecutive boundary steps.
///
/// Walking pixel centres overestimates curved outlines by the staircase; the
/// midpoint polygon cuts each stair corner and tracks the true outline much
/// more closely. A single pixel, or a boundary that only walks back over
/// itself between two pixels, measures zero.
pub fn midpoint_perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len();
    let midpoints: Vec<PointF> = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            PointF::new((a.x + b.x) as f64 / 2.0, (a.y + b.y) as f64 / 2.0)
        })
        .collect();

    (0..n)
        .map(|i| midpoints[i].distance(&midpoints[(i + 1) % n]))
        .sum()
}

/// Arithmetic mean of the points
pub fn mean_point(points: &[Point]) -> Option<PointF> {
    if points.is_empty() {
        return None;
    }

    let (sx, sy) = points
        .iter()
        .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
    let n = points.len() as f64;
    Some(PointF::new(sx as f64 / n, sy as f64 / n))
}

/// Area-weighted centroid of the closed polygon (first-order moments).
///
/// Falls back to the mean of the vertices when the polygon encloses no area,
/// e.g. a boundary traced around a one pixel wide line.
pub fn centroid(points: &[Point]) -> Option<PointF> {
    let area = signed_area(points);
    if area.abs() < 1e-9 {
        return mean_point(points);
    }

    let n = points.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = points[i].to_f64();
        let q = points[(i + 1) % n].to_f64();
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }

    Some(PointF::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Smallest pixel box containing every point (inclusive of the last pixel)
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (px - ax).hypot(py - ay);
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

/// Douglas-Peucker over an open chain; both endpoints are always kept.
fn simplify_chain(chain: &[Point], epsilon: f64) -> Vec<Point> {
    if chain.len() < 3 {
        return chain.to_vec();
    }

    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[chain.len() - 1] = true;

    let mut stack = vec![(0usize, chain.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = segment_distance(chain[i], chain[start], chain[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplifies a closed polygon with the Douglas-Peucker algorithm.
///
/// The outline is split at the first point and the vertex farthest from it,
/// each half is simplified independently and the halves are rejoined.
pub fn approx_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let origin = points[0];
    let (far_idx, far_dist) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, origin.distance(p)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if far_dist == 0.0 {
        return vec![origin];
    }

    let first_half = simplify_chain(&points[..=far_idx], epsilon);

    let mut second: Vec<Point> = points[far_idx..].to_vec();
    second.push(origin);
    let second_half = simplify_chain(&second, epsilon);

    let mut out = first_half;
    out.pop();
    out.extend_from_slice(&second_half[..second_half.len() - 1]);
    out
}
