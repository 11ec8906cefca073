//! Candidate extraction: outer connected regions of a mask, measured and filtered

pub mod components;

pub use components::{Region, RegionMap};

use crate::segment::Mask;
use imageproc::contours::{find_contours, BorderType};
use log::debug;
use markscan_core::geometry::{centroid, midpoint_perimeter, polygon_area};
use markscan_core::{Candidate, Point};
use serde::{Deserialize, Serialize};

/// How a region's area is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaMode {
    /// Number of foreground pixels; centroid is the pixel mean
    #[default]
    PixelCount,
    /// Shoelace area of the traced boundary; centroid is the polygon centroid
    Polygon,
}

/// Region filters, applied in declaration order. `None` disables a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub min_area: f64,
    pub max_area: f64,
    pub min_width: Option<i32>,
    pub max_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_height: Option<i32>,
    pub min_aspect_ratio: Option<f64>,
    pub min_circularity: Option<f64>,
    pub area_mode: AreaMode,
    /// Keep the traced boundary on each candidate
    pub keep_boundary: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_area: 0.0,
            max_area: f64::MAX,
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
            min_aspect_ratio: None,
            min_circularity: None,
            area_mode: AreaMode::PixelCount,
            keep_boundary: false,
        }
    }
}

impl ExtractOptions {
    /// Small round map markers
    pub fn map_points() -> Self {
        Self {
            min_area: 10.0,
            max_area: 200.0,
            min_circularity: Some(0.5),
            ..Default::default()
        }
    }

    /// Player arrow, boundary kept for orientation
    pub fn arrows() -> Self {
        Self {
            min_area: 200.0,
            max_area: 5000.0,
            keep_boundary: true,
            ..Default::default()
        }
    }

    /// Wide horizontal bars
    pub fn health_bars() -> Self {
        Self {
            min_area: 500.0,
            min_aspect_ratio: Some(2.0),
            ..Default::default()
        }
    }

    /// Outlines for polygon classification
    pub fn shapes() -> Self {
        Self {
            min_area: 10.0,
            area_mode: AreaMode::Polygon,
            keep_boundary: true,
            ..Default::default()
        }
    }

    fn area_bounds(&self) -> (f64, f64) {
        if self.min_area > self.max_area {
            (self.max_area, self.min_area)
        } else {
            (self.min_area, self.max_area)
        }
    }

    fn size_ok(&self, width: i32, height: i32) -> bool {
        self.min_width.is_none_or(|min| width >= min)
            && self.max_width.is_none_or(|max| width <= max)
            && self.min_height.is_none_or(|min| height >= min)
            && self.max_height.is_none_or(|max| height <= max)
    }
}

#[derive(Debug, Default)]
struct Tally {
    internal: usize,
    degenerate: usize,
    area: usize,
    size: usize,
    aspect: usize,
    circularity: usize,
}

/// Finds the outer regions of `mask` and keeps those passing every active filter.
///
/// Candidates come back in discovery order (top-to-bottom, left-to-right by
/// first pixel). Regions with a zero perimeter or zero area are dropped.
pub fn extract(mask: &Mask, options: &ExtractOptions) -> Vec<Candidate> {
    let (min_area, max_area) = options.area_bounds();
    let binary = mask.to_gray();
    let regions = RegionMap::new(&binary);
    let contours = find_contours::<i32>(&binary);
    let mut tally = Tally::default();
    let mut candidates = Vec::new();

    for contour in &contours {
        // holes, and anything sitting inside a hole
        let outer = matches!(contour.border_type, BorderType::Outer);
        if !outer || contour.parent.is_some() {
            if outer {
                tally.internal += 1;
            }
            continue;
        }

        let boundary: Vec<Point> = contour.points.iter().map(|p| Point::new(p.x, p.y)).collect();
        let Some(region) = boundary.first().and_then(|&p| regions.region_at(p)) else {
            tally.degenerate += 1;
            continue;
        };
        let perimeter = midpoint_perimeter(&boundary);

        let (area, center) = match options.area_mode {
            AreaMode::PixelCount => (region.pixel_count as f64, region.mean()),
            AreaMode::Polygon => match centroid(&boundary) {
                Some(c) => (polygon_area(&boundary), c.round()),
                None => (0.0, region.mean()),
            },
        };

        let candidate = match Candidate::new(center, region.bbox, area, perimeter) {
            Some(c) if area > 0.0 => c,
            _ => {
                tally.degenerate += 1;
                continue;
            }
        };

        if area < min_area || area > max_area {
            tally.area += 1;
            continue;
        }
        if !options.size_ok(region.bbox.width, region.bbox.height) {
            tally.size += 1;
            continue;
        }
        if options.min_aspect_ratio.is_some_and(|min| candidate.aspect_ratio < min) {
            tally.aspect += 1;
            continue;
        }
        if options.min_circularity.is_some_and(|min| candidate.circularity < min) {
            tally.circularity += 1;
            continue;
        }

        candidates.push(if options.keep_boundary {
            candidate.with_boundary(boundary)
        } else {
            candidate
        });
    }

    debug!(
        "extract: {} regions, {} contours -> {} candidates (rejected {:?})",
        regions.len(),
        contours.len(),
        candidates.len(),
        tally
    );

    candidates
}
