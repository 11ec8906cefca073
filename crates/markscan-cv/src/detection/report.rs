//! Detection reports

use crate::Result;
use anyhow::Context;
use markscan_core::{DetectionEntry, Point};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Detection statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub total_detections: usize,
    /// Mean over the entries that carry a score, 0 when none do
    pub avg_score: f64,
    pub processing_time_ms: u64,
    /// A template search ran out of its time budget; results are partial
    pub timed_out: bool,
}

/// Everything one detector found in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub detector: String,
    pub image_width: u32,
    pub image_height: u32,
    pub entries: Vec<DetectionEntry>,
    pub stats: DetectionStats,
}

impl DetectionReport {
    /// Numbers the entries 1..=n in their final order and fills the stats
    pub fn new(detector: impl Into<String>, dimensions: (u32, u32), mut entries: Vec<DetectionEntry>, started: Instant) -> Self {
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.id = i + 1;
        }

        let scores: Vec<f64> = entries.iter().filter_map(|e| e.score).collect();
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            detector: detector.into(),
            image_width: dimensions.0,
            image_height: dimensions.1,
            stats: DetectionStats {
                total_detections: entries.len(),
                avg_score,
                processing_time_ms: started.elapsed().as_millis() as u64,
                timed_out: false,
            },
            entries,
        }
    }

    pub fn with_timeout(mut self, timed_out: bool) -> Self {
        self.stats.timed_out = timed_out;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries carrying `label`
    pub fn labeled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a DetectionEntry> + 'a {
        self.entries.iter().filter(move |e| e.label == label)
    }

    pub fn frame_center(&self) -> Point {
        Point::new((self.image_width / 2) as i32, (self.image_height / 2) as i32)
    }

    /// Entry nearest to `center`, ignoring any further than `max_distance`.
    /// The first of equally near entries wins.
    pub fn closest_to(&self, center: Point, max_distance: Option<f64>) -> Option<&DetectionEntry> {
        let mut best: Option<(&DetectionEntry, f64)> = None;
        for entry in &self.entries {
            let distance = entry.position.distance(&center);
            if max_distance.is_some_and(|max| distance > max) {
                continue;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((entry, distance));
            }
        }
        best.map(|(entry, _)| entry)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize detection report")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse detection report")
    }
}
