//! Per-region pixel statistics from an 8-connected labeling.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use markscan_core::{Point, Rect};

/// Pixel statistics of one connected region
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub pixel_count: usize,
    pub bbox: Rect,
    sum_x: i64,
    sum_y: i64,
}

impl Region {
    fn seed(x: i32, y: i32) -> Self {
        Self {
            pixel_count: 0,
            bbox: Rect::new(x, y, 1, 1),
            sum_x: 0,
            sum_y: 0,
        }
    }

    fn add(&mut self, x: i32, y: i32) {
        if self.pixel_count > 0 {
            let right = self.bbox.right().max(x + 1);
            let bottom = self.bbox.bottom().max(y + 1);
            let left = self.bbox.x.min(x);
            let top = self.bbox.y.min(y);
            self.bbox = Rect::new(left, top, right - left, bottom - top);
        }
        self.pixel_count += 1;
        self.sum_x += x as i64;
        self.sum_y += y as i64;
    }

    /// Mean pixel position, rounded to the nearest pixel
    pub fn mean(&self) -> Point {
        let n = self.pixel_count.max(1) as f64;
        Point::new(
            (self.sum_x as f64 / n).round() as i32,
            (self.sum_y as f64 / n).round() as i32,
        )
    }
}

/// Labeled regions of a binary image
pub struct RegionMap {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    regions: Vec<Option<Region>>,
}

impl RegionMap {
    /// Labels the non-zero pixels of `binary` with 8-connectivity
    pub fn new(binary: &GrayImage) -> Self {
        let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));

        let mut regions: Vec<Option<Region>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let id = label[0] as usize;
            if id == 0 {
                continue;
            }
            if regions.len() <= id {
                regions.resize(id + 1, None);
            }
            regions[id]
                .get_or_insert_with(|| Region::seed(x as i32, y as i32))
                .add(x as i32, y as i32);
        }

        Self { labels, regions }
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Region containing pixel `p`, `None` on background
    pub fn region_at(&self, p: Point) -> Option<&Region> {
        if p.x < 0 || p.y < 0 || p.x as u32 >= self.labels.width() || p.y as u32 >= self.labels.height() {
            return None;
        }
        let id = self.labels.get_pixel(p.x as u32, p.y as u32)[0] as usize;
        self.regions.get(id).and_then(Option::as_ref)
    }
}
