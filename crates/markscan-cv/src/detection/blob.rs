//! Colored point markers: map points, monsters

use super::report::DetectionReport;
use crate::disambiguate::{seed_clusters, Cluster};
use crate::error::ensure_image;
use crate::extract::{extract, ExtractOptions};
use crate::segment::{segment, ColorRange, SegmentParams};
use crate::traits::Detector;
use crate::Result;
use image::{imageops, RgbImage};
use log::debug;
use markscan_core::{Candidate, DetectionEntry, Point, Rect};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Each color is segmented on its own; its name becomes the entry label
    pub colors: Vec<ColorRange>,
    pub segment: SegmentParams,
    pub extract: ExtractOptions,
    /// Points strictly closer than this collapse into one; `0` disables merging
    pub merge_radius: f64,
    /// Only this part of the frame is searched, clipped to the frame
    pub roi: Option<Rect>,
    /// Candidates whose box starts inside one of these are dropped
    pub exclude: Vec<Rect>,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self::map_points()
    }
}

impl BlobParams {
    /// Orange, red and yellow map points
    pub fn map_points() -> Self {
        Self {
            colors: vec![ColorRange::orange(), ColorRange::red(), ColorRange::yellow()],
            segment: SegmentParams::map_points(),
            extract: ExtractOptions::map_points(),
            merge_radius: 10.0,
            roi: None,
            exclude: Vec::new(),
        }
    }

    /// Yellow monster dots, heavier cleanup and no merging
    pub fn monsters() -> Self {
        Self {
            colors: vec![ColorRange::monster_yellow()],
            segment: SegmentParams {
                blur_sigma: 0.0,
                open_radius: 2,
                open_iterations: 1,
                close_radius: 3,
                close_iterations: 1,
            },
            extract: ExtractOptions {
                min_area: 20.0,
                max_area: 500.0,
                min_circularity: Some(0.5),
                ..Default::default()
            },
            merge_radius: 0.0,
            roi: None,
            exclude: Vec::new(),
        }
    }

    /// Monster name plates on the game screen. The HP bar corner is excluded.
    pub fn name_plates() -> Self {
        Self {
            colors: vec![ColorRange::passive_name(), ColorRange::aggressive_name()],
            segment: SegmentParams {
                blur_sigma: 0.0,
                open_radius: 0,
                open_iterations: 0,
                close_radius: 5,
                close_iterations: 1,
            },
            extract: ExtractOptions {
                min_width: Some(16),
                max_width: Some(149),
                ..Default::default()
            },
            merge_radius: 0.0,
            roi: None,
            exclude: vec![Rect::new(0, 0, 251, 111)],
        }
    }

    /// Drops everything at or above `bottom` pixels from the lower edge
    pub fn without_bottom(mut self, width: u32, height: u32, bottom: u32) -> Self {
        let height = height.saturating_sub(bottom);
        self.roi = Some(Rect::new(0, 0, width as i32, height as i32));
        self
    }

    fn excluded(&self, candidate: &Candidate) -> bool {
        let corner = Point::new(candidate.bbox.x, candidate.bbox.y);
        self.exclude.iter().any(|r| r.contains(corner))
    }
}

/// Multi-color point detector
#[derive(Debug, Clone, Default)]
pub struct BlobDetector {
    params: BlobParams,
}

impl BlobDetector {
    pub fn new(params: BlobParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    /// Labeled candidates of every color, in color order and frame coordinates
    pub fn candidates(&self, image: &RgbImage) -> Vec<(String, Candidate)> {
        let frame = Rect::new(0, 0, image.width() as i32, image.height() as i32);
        let area = match self.params.roi {
            Some(roi) => match roi.intersection(&frame) {
                Some(area) => area,
                None => {
                    debug!("blob: roi {:?} lies outside the {}x{} frame", roi, frame.width, frame.height);
                    return Vec::new();
                }
            },
            None => frame,
        };

        let cropped;
        let view = if area == frame {
            image
        } else {
            cropped = imageops::crop_imm(image, area.x as u32, area.y as u32, area.width as u32, area.height as u32)
                .to_image();
            &cropped
        };

        let mut found = Vec::new();
        for color in &self.params.colors {
            let mask = segment(view, color, &self.params.segment);
            let candidates: Vec<Candidate> = extract(&mask, &self.params.extract)
                .into_iter()
                .map(|c| c.translated(area.x, area.y))
                .filter(|c| !self.params.excluded(c))
                .collect();
            debug!("blob '{}': {} candidates", color.name, candidates.len());
            found.extend(candidates.into_iter().map(|c| (color.name.clone(), c)));
        }
        found
    }

    fn entry(label: &str, cluster: &Cluster) -> DetectionEntry {
        let seed = cluster.seed();
        let mut entry = DetectionEntry::from_candidate(label, seed);
        entry.position = cluster.center();
        entry.radius = Some(cluster.mean_radius());
        entry
    }
}

impl Detector for BlobDetector {
    fn name(&self) -> &str {
        "blobs"
    }

    fn detect(&self, image: &RgbImage) -> Result<DetectionReport> {
        ensure_image(image.width(), image.height())?;
        let started = Instant::now();

        let labeled = self.candidates(image);
        let points: Vec<Point> = labeled.iter().map(|(_, c)| c.centroid).collect();

        let clusters = if self.params.merge_radius > 0.0 {
            seed_clusters(&points, self.params.merge_radius)
        } else {
            (0..points.len()).map(|i| vec![i]).collect()
        };

        let entries: Vec<DetectionEntry> = clusters
            .iter()
            .map(|indices| {
                let (label, seed) = &labeled[indices[0]];
                let mut cluster = Cluster::new(seed.clone());
                for &i in &indices[1..] {
                    cluster.absorb(labeled[i].1.clone());
                }
                Self::entry(label, &cluster)
            })
            .collect();

        debug!("blobs: {} candidates -> {} points", labeled.len(), entries.len());
        Ok(DetectionReport::new(self.name(), image.dimensions(), entries, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn dot(img: &mut RgbImage, cx: i32, cy: i32, r: i32, color: Rgb<u8>) {
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r && x >= 0 && y >= 0 {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    #[test]
    fn test_colors_labelled() {
        let mut img = RgbImage::from_pixel(80, 60, Rgb([30, 30, 30]));
        dot(&mut img, 20, 20, 5, Rgb([255, 140, 0]));
        dot(&mut img, 60, 40, 5, Rgb([255, 255, 0]));

        let report = BlobDetector::new(BlobParams::map_points()).detect(&img).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.entries[0].label, "orange");
        assert_eq!(report.entries[1].label, "yellow");
        assert_eq!(report.entries[0].id, 1);
        assert!(report.entries[0].radius.unwrap() > 3.5);
    }

    fn plate(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        for py in y..y + h {
            for px in x..x + w {
                img.put_pixel(px, py, color);
            }
        }
    }

    #[test]
    fn test_roi_maps_back_to_frame() {
        let mut img = RgbImage::from_pixel(80, 60, Rgb([30, 30, 30]));
        dot(&mut img, 20, 20, 5, Rgb([255, 140, 0]));
        dot(&mut img, 60, 40, 5, Rgb([255, 140, 0]));

        let params = BlobParams {
            roi: Some(Rect::new(40, 25, 100, 100)),
            ..BlobParams::map_points()
        };
        let report = BlobDetector::new(params).detect(&img).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries[0].position, Point::new(60, 40));
        let bbox = report.entries[0].bbox.unwrap();
        assert_eq!((bbox.x, bbox.y), (55, 35));
    }

    #[test]
    fn test_roi_outside_frame_finds_nothing() {
        let mut img = RgbImage::from_pixel(80, 60, Rgb([30, 30, 30]));
        dot(&mut img, 20, 20, 5, Rgb([255, 140, 0]));

        let params = BlobParams {
            roi: Some(Rect::new(100, 0, 20, 20)),
            ..BlobParams::map_points()
        };
        let report = BlobDetector::new(params).detect(&img).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_exclusion_uses_box_corner() {
        let mut img = RgbImage::from_pixel(80, 60, Rgb([30, 30, 30]));
        dot(&mut img, 20, 20, 5, Rgb([255, 140, 0]));
        dot(&mut img, 60, 40, 5, Rgb([255, 140, 0]));

        // the second dot's centre is inside, its corner (55, 35) is not
        let params = BlobParams {
            exclude: vec![Rect::new(0, 0, 30, 30), Rect::new(56, 36, 20, 20)],
            ..BlobParams::map_points()
        };
        let report = BlobDetector::new(params).detect(&img).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries[0].position, Point::new(60, 40));
    }

    #[test]
    fn test_name_plates() {
        let passive = Rgb([250, 250, 200]);
        let aggressive = Rgb([250, 20, 0]);
        let mut img = RgbImage::from_pixel(400, 300, Rgb([20, 40, 20]));
        plate(&mut img, 300, 150, 40, 8, passive);
        plate(&mut img, 100, 200, 60, 8, aggressive);
        // HP bar corner
        plate(&mut img, 50, 50, 40, 8, passive);
        // too narrow, too wide
        plate(&mut img, 300, 30, 10, 8, passive);
        plate(&mut img, 200, 100, 160, 8, aggressive);
        // below the search area
        plate(&mut img, 150, 280, 40, 8, passive);

        let params = BlobParams::name_plates().without_bottom(400, 300, 25);
        let report = BlobDetector::new(params).detect(&img).unwrap();

        let mut found: Vec<(String, i32, i32)> =
            report.entries.iter().map(|e| (e.label.clone(), e.bbox.unwrap().x, e.bbox.unwrap().y)).collect();
        found.sort();
        assert_eq!(
            found,
            vec![("aggressive".to_string(), 100, 200), ("passive".to_string(), 300, 150)]
        );
    }

    #[test]
    fn test_empty_image_is_an_error() {
        assert!(BlobDetector::default().detect(&RgbImage::new(0, 0)).is_err());
    }
}
