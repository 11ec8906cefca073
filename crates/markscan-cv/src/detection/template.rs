//! Template-based detection on the grayscale frame

use super::report::DetectionReport;
use crate::error::ensure_image;
use crate::template::{ResultPolicy, ScaleRange, SearchParams, TemplateSearcher};
use crate::traits::Detector;
use crate::Result;
use anyhow::Context;
use image::{imageops, GrayImage, RgbImage};
use log::debug;
use markscan_core::{DetectionEntry, TemplateMatch};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateParams {
    /// Label given to every match
    pub label: String,
    pub search: SearchParams,
    pub policy: ResultPolicy,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            label: "template".to_string(),
            search: SearchParams::multi_scale(),
            policy: ResultPolicy::default(),
        }
    }
}

impl TemplateParams {
    /// Monster sprites: 0.8x to 1.2x, centres kept apart by 30% of the width
    pub fn monsters() -> Self {
        Self {
            label: "monster".to_string(),
            search: SearchParams {
                threshold: 0.7,
                scales: ScaleRange::additive(0.8, 1.2, 0.1),
                timeout_ms: Some(1000),
                ..Default::default()
            },
            policy: ResultPolicy::Distance { ratio: 0.3 },
        }
    }
}

/// Looks for one template, possibly scaled and rotated
#[derive(Debug, Clone)]
pub struct TemplateDetector {
    template: GrayImage,
    params: TemplateParams,
    searcher: TemplateSearcher,
}

impl TemplateDetector {
    pub fn new(template: GrayImage, params: TemplateParams) -> Self {
        let searcher = TemplateSearcher::new(params.search.clone());
        Self {
            template,
            params,
            searcher,
        }
    }

    /// Template taken from a color image
    pub fn from_rgb(template: &RgbImage, params: TemplateParams) -> Self {
        Self::new(imageops::grayscale(template), params)
    }

    pub fn params(&self) -> &TemplateParams {
        &self.params
    }

    /// Matches after the result policy, best first
    pub fn find(&self, image: &GrayImage) -> Result<(Vec<TemplateMatch>, bool)> {
        let outcome = self
            .searcher
            .search(image, &self.template)
            .context("Template search failed")?;
        let raw = outcome.matches.len();

        let kept: Vec<TemplateMatch> = self
            .params
            .policy
            .apply(outcome.matches)
            .into_iter()
            .map(|m| m.with_label(self.params.label.clone()))
            .collect();

        debug!("template '{}': {} raw -> {} kept", self.params.label, raw, kept.len());
        Ok((kept, outcome.timed_out))
    }
}

impl Detector for TemplateDetector {
    fn name(&self) -> &str {
        "template"
    }

    fn detect(&self, image: &RgbImage) -> Result<DetectionReport> {
        ensure_image(image.width(), image.height())?;
        let started = Instant::now();

        let gray = imageops::grayscale(image);
        let (matches, timed_out) = self.find(&gray)?;
        let rotating = self.params.search.angles.is_rotating();

        let entries: Vec<DetectionEntry> = matches
            .iter()
            .map(|m| {
                let mut entry = DetectionEntry::from_match(m);
                if rotating {
                    entry.rotation = Some(m.angle);
                }
                entry
            })
            .collect();

        Ok(DetectionReport::new(self.name(), image.dimensions(), entries, started).with_timeout(timed_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn scene() -> RgbImage {
        RgbImage::from_fn(60, 40, |x, y| {
            let v = ((x * 11 + y * 7 + (x * y) % 13) % 200) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_finds_cropped_patch() {
        let image = scene();
        let patch = imageops::crop_imm(&image, 20, 12, 10, 8).to_image();

        let detector = TemplateDetector::from_rgb(
            &patch,
            TemplateParams {
                label: "patch".to_string(),
                search: SearchParams {
                    threshold: 0.99,
                    ..Default::default()
                },
                policy: ResultPolicy::Best,
            },
        );
        let report = detector.detect(&image).unwrap();
        assert_eq!(report.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.label, "patch");
        assert_eq!(entry.bbox.map(|b| (b.x, b.y)), Some((20, 12)));
        assert!(entry.score.unwrap() >= 0.99);
        assert!(entry.rotation.is_none());
        assert!(!report.stats.timed_out);
    }

    #[test]
    fn test_monster_preset_keeps_centres_apart() {
        let sprite = GrayImage::from_fn(10, 10, |x, y| Luma([((x * 37 + y * 91 + x * y * 7) % 200 + 40) as u8]));
        let mut frame = GrayImage::new(60, 40);
        imageops::replace(&mut frame, &sprite, 10, 10);
        imageops::replace(&mut frame, &sprite, 40, 20);

        let params = TemplateParams::monsters();
        let detector = TemplateDetector::new(sprite, params.clone());
        let (kept, timed_out) = detector.find(&frame).unwrap();
        assert!(!timed_out);

        let mut top: Vec<(i32, i32)> = kept.iter().take(2).map(|m| (m.x, m.y)).collect();
        top.sort();
        assert_eq!(top, vec![(10, 10), (40, 20)]);
        assert!(kept.iter().all(|m| m.label == "monster"));

        let ResultPolicy::Distance { ratio } = params.policy else {
            panic!("monster preset suppresses by distance");
        };
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                let avg_width = (a.width + b.width) as f64 / 2.0;
                assert!(a.center().distance(&b.center()) >= avg_width * ratio);
            }
        }
    }

    #[test]
    fn test_empty_template_is_an_error() {
        let detector = TemplateDetector::new(GrayImage::new(0, 0), TemplateParams::default());
        assert!(detector.detect(&scene()).is_err());
    }
}
