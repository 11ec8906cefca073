//! Integer and floating point primitives shared by every detector stage.

pub mod hull;
pub mod polygon;
pub mod rect;

pub use hull::{convex_hull, hull_interior_angles};
pub use polygon::{approx_polygon, arc_length, bounding_rect, centroid, mean_point, midpoint_perimeter, polygon_area};
pub use rect::{min_area_rect, RotatedRect};

use serde::{Deserialize, Serialize};

/// A pixel coordinate. `y` grows downwards, as in every image buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another pixel
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_f64(self) -> PointF {
        PointF::new(self.x as f64, self.y as f64)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// A sub-pixel position in image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rounds both coordinates to the nearest pixel
    pub fn round(self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Point> for PointF {
    fn from(p: Point) -> Self {
        p.to_f64()
    }
}

/// Axis aligned box, `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Calculate area of the box
    pub fn area(&self) -> f64 {
        self.width.max(0) as f64 * self.height.max(0) as f64
    }

    /// Centre pixel, rounded towards the top-left like integer division
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Width divided by height, `0.0` for a zero-height box
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            self.width as f64 / self.height as f64
        } else {
            0.0
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    /// Overlapping region, `None` when the boxes do not share any area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Calculate intersection over union (IoU) with another box
    pub fn iou(&self, other: &Rect) -> f64 {
        let Some(overlap) = self.intersection(other) else {
            return 0.0;
        };

        let intersection = overlap.area();
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }

        intersection / union
    }
}
