use super::Point;

fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Convex hull by Andrew's monotone chain.
///
/// Collinear points are dropped, so every returned vertex is a real corner.
/// Fewer than three distinct points come back deduplicated and sorted.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by_key(|p| (p.x, p.y));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Interior angle in degrees at every hull vertex, formed by its two
/// hull-adjacent neighbours. `None` where a neighbour coincides with the vertex.
pub fn hull_interior_angles(hull: &[Point]) -> Vec<Option<f64>> {
    let n = hull.len();
    if n < 3 {
        return vec![None; n];
    }

    (0..n)
        .map(|i| {
            let prev = hull[(i + n - 1) % n];
            let cur = hull[i];
            let next = hull[(i + 1) % n];

            let v1 = ((prev.x - cur.x) as f64, (prev.y - cur.y) as f64);
            let v2 = ((next.x - cur.x) as f64, (next.y - cur.y) as f64);
            let n1 = v1.0.hypot(v1.1);
            let n2 = v2.0.hypot(v2.1);
            if n1 == 0.0 || n2 == 0.0 {
                return None;
            }

            let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
            Some(cos.acos().to_degrees())
        })
        .collect()
}
