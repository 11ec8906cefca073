//! Template search over scales and rotations

pub mod correlation;
pub mod matcher;

pub use correlation::{correlate, ScoreMap};
pub use matcher::{SearchOutcome, TemplateSearcher};

use crate::disambiguate::nms;
use markscan_core::TemplateMatch;
use serde::{Deserialize, Serialize};

/// Similarity measure computed at every placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMetric {
    /// Correlation coefficient, robust to brightness offsets
    CcoeffNormed,
    CcorrNormed,
    /// Normalized squared difference (inverted: lower is better)
    SqdiffNormed,
    Ccoeff,
    Ccorr,
    /// Raw squared difference (inverted)
    Sqdiff,
}

impl MatchMetric {
    pub const ALL: [MatchMetric; 6] = [
        MatchMetric::CcoeffNormed,
        MatchMetric::CcorrNormed,
        MatchMetric::SqdiffNormed,
        MatchMetric::Ccoeff,
        MatchMetric::Ccorr,
        MatchMetric::Sqdiff,
    ];

    pub fn is_inverted(&self) -> bool {
        matches!(self, MatchMetric::Sqdiff | MatchMetric::SqdiffNormed)
    }

    pub fn is_normalized(&self) -> bool {
        matches!(
            self,
            MatchMetric::CcoeffNormed | MatchMetric::CcorrNormed | MatchMetric::SqdiffNormed
        )
    }

    /// Whether a raw metric value passes `threshold`
    pub fn passes(&self, value: f64, threshold: f64) -> bool {
        if self.is_inverted() { value <= threshold } else { value >= threshold }
    }

    /// Raw value on the "higher is better" scale
    pub fn to_score(&self, value: f64) -> f64 {
        if self.is_inverted() { 1.0 - value } else { value }
    }
}

/// How scales are stepped between `min` and `max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScaleStep {
    /// `min, min + step, ...`
    Additive(f64),
    /// `min, min * step, ...`
    Multiplicative(f64),
    /// `count` evenly spaced values, both ends included
    Count(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
    pub step: ScaleStep,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::single(1.0)
    }
}

impl ScaleRange {
    pub fn single(scale: f64) -> Self {
        Self {
            min: scale,
            max: scale,
            step: ScaleStep::Count(1),
        }
    }

    pub fn additive(min: f64, max: f64, step: f64) -> Self {
        Self {
            min,
            max,
            step: ScaleStep::Additive(step),
        }
    }

    pub fn multiplicative(min: f64, max: f64, factor: f64) -> Self {
        Self {
            min,
            max,
            step: ScaleStep::Multiplicative(factor),
        }
    }

    pub fn linspace(min: f64, max: f64, count: usize) -> Self {
        Self {
            min,
            max,
            step: ScaleStep::Count(count),
        }
    }

    fn bounds(&self) -> (f64, f64) {
        if self.min > self.max { (self.max, self.min) } else { (self.min, self.max) }
    }

    /// Scale number `i`, counted from the low end
    fn value_at(&self, i: usize) -> f64 {
        let (lo, hi) = self.bounds();
        if i == 0 {
            return lo;
        }
        match self.step {
            ScaleStep::Additive(step) => lo + i as f64 * step,
            ScaleStep::Multiplicative(factor) => match i32::try_from(i) {
                Ok(k) => lo * factor.powi(k),
                Err(_) => lo * factor.powf(i as f64),
            },
            ScaleStep::Count(count) if count > 1 => lo + (hi - lo) * i as f64 / (count - 1) as f64,
            ScaleStep::Count(_) => lo,
        }
    }

    /// Number of scales, computed without listing them.
    /// A reversed range is swapped; a step that cannot advance yields one.
    pub fn len(&self) -> usize {
        let (lo, hi) = self.bounds();
        let limit = hi + 1e-9 * hi.abs().max(1.0);

        let estimate = match self.step {
            ScaleStep::Additive(step) if step > 0.0 => (limit - lo) / step,
            ScaleStep::Multiplicative(factor) if factor > 1.0 && lo > 0.0 => (limit / lo).ln() / factor.ln(),
            ScaleStep::Count(count) => return count.max(1),
            _ => return 1,
        };
        // float to int casts saturate, NaN becomes 0
        let mut n = (estimate.floor() as usize).saturating_add(1).max(1);
        while n > 1 && self.value_at(n - 1) > limit {
            n -= 1;
        }
        while n < usize::MAX && self.value_at(n) <= limit {
            n += 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scales to try, in increasing order, produced lazily
    pub fn iter(&self) -> impl Iterator<Item = f64> + use<> {
        let range = *self;
        (0..range.len()).map(move |i| range.value_at(i))
    }
}

/// Clockwise rotations `start, start + step, ...` strictly below `end`, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::none()
    }
}

impl AngleRange {
    /// No rotation
    pub fn none() -> Self {
        Self {
            start: 0.0,
            end: 0.0,
            step: 0.0,
        }
    }

    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Full turn in `step` degree increments
    pub fn full(step: f64) -> Self {
        Self::new(0.0, 360.0, step)
    }

    pub fn is_rotating(&self) -> bool {
        self.start != self.end
    }

    fn bounds(&self) -> (f64, f64) {
        if self.start > self.end { (self.end, self.start) } else { (self.start, self.end) }
    }

    /// Number of angles, computed without listing them.
    /// Zero width or a non-positive step gives one.
    pub fn len(&self) -> usize {
        if !self.is_rotating() || !(self.step > 0.0) {
            return 1;
        }
        let (lo, hi) = self.bounds();
        let mut n = (((hi - lo) / self.step).ceil() as usize).max(1);
        while n > 1 && lo + (n - 1) as f64 * self.step >= hi {
            n -= 1;
        }
        while n < usize::MAX && lo + n as f64 * self.step < hi {
            n += 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Angles to try, produced lazily. Zero width gives `[0]`; a
    /// non-positive step gives `[start]`.
    pub fn iter(&self) -> impl Iterator<Item = f64> + use<> {
        let range = *self;
        let (lo, _) = range.bounds();
        let rotating = range.is_rotating();
        (0..range.len()).map(move |i| match i {
            _ if !rotating => 0.0,
            0 => lo,
            _ => lo + i as f64 * range.step,
        })
    }
}

/// Template search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub metric: MatchMetric,
    /// Compared against the raw metric value: `>=` normally, `<=` for inverted metrics
    pub threshold: f64,
    pub scales: ScaleRange,
    pub angles: AngleRange,
    /// Wall-clock budget for the whole search, checked between combinations
    pub timeout_ms: Option<u64>,
    /// Gray level for corners uncovered by rotation
    pub fill: u8,
    /// Resampled templates narrower or shorter than this are skipped
    pub min_template_side: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            metric: MatchMetric::CcoeffNormed,
            threshold: 0.8,
            scales: ScaleRange::default(),
            angles: AngleRange::none(),
            timeout_ms: None,
            fill: 0,
            min_template_side: 3,
        }
    }
}

impl SearchParams {
    /// Interactive matcher defaults: 0.5x to 1.5x, one second budget
    pub fn multi_scale() -> Self {
        Self {
            threshold: 0.7,
            scales: ScaleRange::linspace(0.5, 1.5, 11),
            timeout_ms: Some(1000),
            ..Default::default()
        }
    }

    /// Rotating search for directional markers
    pub fn rotating(step: f64) -> Self {
        Self {
            threshold: 0.7,
            angles: AngleRange::full(step),
            timeout_ms: Some(1000),
            ..Default::default()
        }
    }

    /// Squared difference, lower raw values are better
    pub fn sqdiff() -> Self {
        Self {
            metric: MatchMetric::SqdiffNormed,
            threshold: 0.15,
            ..Default::default()
        }
    }

    /// Number of (angle, scale) combinations the search will visit
    pub fn combinations(&self) -> usize {
        self.angles.len().saturating_mul(self.scales.len())
    }
}

/// What to keep from the raw hits of a search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResultPolicy {
    /// Greedy IoU suppression
    Nms { overlap: f64 },
    /// Greedy suppression of centres closer than `ratio` times the mean width
    Distance { ratio: f64 },
    /// Single best match
    Best,
    /// `n` best matches, overlaps allowed
    TopN(usize),
    /// Everything, best first
    All,
}

impl Default for ResultPolicy {
    fn default() -> Self {
        ResultPolicy::Nms { overlap: 0.3 }
    }
}

impl ResultPolicy {
    pub fn apply(&self, mut matches: Vec<TemplateMatch>) -> Vec<TemplateMatch> {
        match *self {
            ResultPolicy::Nms { overlap } => nms::suppress(matches, overlap),
            ResultPolicy::Distance { ratio } => nms::suppress_by_distance(matches, ratio),
            ResultPolicy::Best => {
                nms::sort_by_score(&mut matches);
                matches.truncate(1);
                matches
            }
            ResultPolicy::TopN(n) => {
                nms::sort_by_score(&mut matches);
                matches.truncate(n);
                matches
            }
            ResultPolicy::All => {
                nms::sort_by_score(&mut matches);
                matches
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverted_metrics() {
        assert!(MatchMetric::SqdiffNormed.passes(0.1, 0.15));
        assert!(!MatchMetric::SqdiffNormed.passes(0.2, 0.15));
        assert_relative_eq!(MatchMetric::SqdiffNormed.to_score(0.1), 0.9);
        assert!(MatchMetric::CcoeffNormed.passes(0.9, 0.9));
        assert_eq!(MatchMetric::ALL.iter().filter(|m| m.is_inverted()).count(), 2);
    }

    fn scales(range: ScaleRange) -> Vec<f64> {
        range.iter().collect()
    }

    fn angles(range: AngleRange) -> Vec<f64> {
        range.iter().collect()
    }

    #[test]
    fn test_scale_values() {
        let additive = scales(ScaleRange::additive(0.5, 1.0, 0.25));
        assert_eq!(additive, vec![0.5, 0.75, 1.0]);

        // swapped bounds
        assert_eq!(scales(ScaleRange::additive(1.0, 0.5, 0.25)).len(), 3);

        let mult = scales(ScaleRange::multiplicative(1.0, 4.0, 2.0));
        assert_eq!(mult, vec![1.0, 2.0, 4.0]);

        let lin = scales(ScaleRange::linspace(0.5, 1.5, 11));
        assert_eq!(lin.len(), 11);
        assert_relative_eq!(lin[10], 1.5);

        assert_eq!(scales(ScaleRange::additive(0.8, 1.2, 0.0)), vec![0.8]);
        assert_eq!(scales(ScaleRange::multiplicative(0.8, 1.2, 1.0)), vec![0.8]);
        assert_eq!(scales(ScaleRange::default()), vec![1.0]);
    }

    #[test]
    fn test_additive_reaches_max_despite_rounding() {
        let values = scales(ScaleRange::additive(0.1, 0.3, 0.1));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_angle_values() {
        assert_eq!(angles(AngleRange::none()), vec![0.0]);
        assert_eq!(angles(AngleRange::new(45.0, 45.0, 10.0)), vec![0.0]);
        assert_eq!(angles(AngleRange::full(90.0)), vec![0.0, 90.0, 180.0, 270.0]);
        assert_eq!(angles(AngleRange::new(0.0, 30.0, 0.0)), vec![0.0]);
        assert_eq!(angles(AngleRange::new(30.0, 0.0, 10.0)), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_tiny_steps_are_counted_not_listed() {
        let scales = ScaleRange::additive(1.0, 2.0, 1e-7);
        let angles = AngleRange::new(0.0, 360.0, 1e-5);
        assert!((10_000_000..=10_000_002).contains(&scales.len()));
        assert!((35_999_999..=36_000_001).contains(&angles.len()));

        let params = SearchParams {
            scales,
            angles,
            ..Default::default()
        };
        assert_eq!(params.combinations(), angles.len() * scales.len());
        assert_eq!(scales.iter().take(3).count(), 3);
    }

    #[test]
    fn test_counts_match_listed_values() {
        for range in [
            ScaleRange::additive(0.5, 1.5, 0.1),
            ScaleRange::multiplicative(0.5, 2.0, 1.1),
            ScaleRange::multiplicative(1.0, 8.0, 2.0),
            ScaleRange::linspace(0.5, 1.5, 11),
        ] {
            let values = scales(range);
            assert_eq!(values.len(), range.len());
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            assert!(*values.last().unwrap() <= range.max + 1e-6);
        }
        assert_eq!(AngleRange::full(1.0).len(), 360);
        assert_eq!(AngleRange::full(7.0).len(), 52);
    }

    #[test]
    fn test_result_policies() {
        let hits = vec![
            TemplateMatch::new(0, 0, 10, 10, 0.8),
            TemplateMatch::new(1, 1, 10, 10, 0.95),
            TemplateMatch::new(40, 40, 10, 10, 0.85),
        ];

        assert_eq!(ResultPolicy::Nms { overlap: 0.3 }.apply(hits.clone()).len(), 2);
        let spaced = ResultPolicy::Distance { ratio: 0.3 }.apply(hits.clone());
        assert_eq!(spaced.iter().map(|m| m.score).collect::<Vec<_>>(), vec![0.95, 0.85]);
        let best = ResultPolicy::Best.apply(hits.clone());
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].score, 0.95);
        assert_eq!(ResultPolicy::TopN(2).apply(hits.clone())[1].score, 0.85);
        assert_eq!(ResultPolicy::All.apply(hits).len(), 3);
    }
}
