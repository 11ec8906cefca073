use super::{convex_hull, Point, PointF};
use serde::{Deserialize, Serialize};

/// A rectangle rotated about its centre.
///
/// `angle` is the direction of the long side in image coordinates, degrees
/// measured from +x towards +y (clockwise on screen), normalised to `[0, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: PointF,
    pub long_side: f64,
    pub short_side: f64,
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.long_side * self.short_side
    }

    /// Unit vector along the long side (image coordinates)
    pub fn long_axis(&self) -> (f64, f64) {
        let rad = self.angle.to_radians();
        (rad.cos(), rad.sin())
    }

    pub fn corners(&self) -> [PointF; 4] {
        let (ux, uy) = self.long_axis();
        let (vx, vy) = (-uy, ux);
        let (hl, hs) = (self.long_side / 2.0, self.short_side / 2.0);
        let c = self.center;
        [
            PointF::new(c.x - ux * hl - vx * hs, c.y - uy * hl - vy * hs),
            PointF::new(c.x + ux * hl - vx * hs, c.y + uy * hl - vy * hs),
            PointF::new(c.x + ux * hl + vx * hs, c.y + uy * hl + vy * hs),
            PointF::new(c.x - ux * hl + vx * hs, c.y - uy * hl + vy * hs),
        ]
    }
}

fn axis_angle(dx: f64, dy: f64) -> f64 {
    let angle = dy.atan2(dx).to_degrees().rem_euclid(180.0);
    // rem_euclid can return exactly 180.0 after rounding
    if angle >= 180.0 { 0.0 } else { angle }
}

/// Minimum-area enclosing rectangle via rotating calipers over the hull edges.
///
/// Returns `None` for an empty point set. Two distinct points give a
/// zero-width rectangle along their segment; one point a zero-sized one.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let hull = convex_hull(points);

    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0].to_f64(),
                long_side: 0.0,
                short_side: 0.0,
                angle: 0.0,
            });
        }
        2 => {
            let (a, b) = (hull[0].to_f64(), hull[1].to_f64());
            return Some(RotatedRect {
                center: PointF::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
                long_side: a.distance(&b),
                short_side: 0.0,
                angle: axis_angle(b.x - a.x, b.y - a.y),
            });
        }
        _ => {}
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    let n = hull.len();
    for i in 0..n {
        let a = hull[i].to_f64();
        let b = hull[(i + 1) % n].to_f64();
        let len = a.distance(&b);
        if len == 0.0 {
            continue;
        }

        let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u, mut min_v, mut max_v) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &hull {
            let (px, py) = (p.x as f64 - a.x, p.y as f64 - a.y);
            let pu = px * ux + py * uy;
            let pv = px * vx + py * vy;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let (extent_u, extent_v) = (max_u - min_u, max_v - min_v);
        let area = extent_u * extent_v;
        if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
            continue;
        }

        let mid_u = (min_u + max_u) / 2.0;
        let mid_v = (min_v + max_v) / 2.0;
        let center = PointF::new(a.x + ux * mid_u + vx * mid_v, a.y + uy * mid_u + vy * mid_v);

        let rect = if extent_u >= extent_v {
            RotatedRect { center, long_side: extent_u, short_side: extent_v, angle: axis_angle(ux, uy) }
        } else {
            RotatedRect { center, long_side: extent_v, short_side: extent_u, angle: axis_angle(vx, vy) }
        };
        best = Some((area, rect));
    }

    best.map(|(_, rect)| rect)
}
