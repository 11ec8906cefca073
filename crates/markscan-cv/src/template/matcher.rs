//! Multi-scale, multi-rotation template search with a time budget

use super::correlation::{correlate_prepared, PreparedImage};
use super::SearchParams;
use crate::error::{ensure_finite, InputError};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use log::{debug, trace, warn};
use markscan_core::{normalize_degrees, TemplateMatch};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Raw hits of one search plus how far it got
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Every placement that passed the threshold, scores on the "higher is better" scale
    pub matches: Vec<TemplateMatch>,
    /// The time budget ran out before every combination was tried
    pub timed_out: bool,
    pub combinations_searched: usize,
    pub combinations_total: usize,
    pub elapsed_ms: u64,
}

/// Slides resampled, rotated copies of a template over an image
#[derive(Debug, Clone, Default)]
pub struct TemplateSearcher {
    params: SearchParams,
}

impl TemplateSearcher {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Template resampled by `scale` and rotated clockwise by `angle` degrees,
    /// or `None` when it falls outside the usable size range.
    pub fn transform_template(&self, template: &GrayImage, scale: f64, angle: f64, max_w: u32, max_h: u32) -> Option<GrayImage> {
        let w = (template.width() as f64 * scale + 1e-9).floor();
        let h = (template.height() as f64 * scale + 1e-9).floor();
        let min_side = self.params.min_template_side.max(1) as f64;
        if !(w >= min_side && h >= min_side) || w > max_w as f64 || h > max_h as f64 {
            return None;
        }
        let (w, h) = (w as u32, h as u32);

        let resized = if w == template.width() && h == template.height() {
            template.clone()
        } else {
            let filter = if scale < 1.0 { FilterType::Triangle } else { FilterType::CatmullRom };
            imageops::resize(template, w, h, filter)
        };

        let angle = normalize_degrees(angle);
        if angle == 0.0 {
            return Some(resized);
        }
        Some(rotate_about_center(
            &resized,
            angle.to_radians() as f32,
            Interpolation::Bilinear,
            Luma([self.params.fill]),
        ))
    }

    /// Runs the search. Only empty inputs or a non-finite threshold are
    /// errors; oversize combinations are skipped and a spent time budget
    /// ends the search early with `timed_out` set.
    pub fn search(&self, image: &GrayImage, template: &GrayImage) -> Result<SearchOutcome, InputError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(InputError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        if template.width() == 0 || template.height() == 0 {
            return Err(InputError::EmptyTemplate {
                width: template.width(),
                height: template.height(),
            });
        }
        ensure_finite("threshold", self.params.threshold)?;

        let start = Instant::now();
        let budget = self.params.timeout_ms.map(Duration::from_millis);
        let metric = self.params.metric;
        let prepared = PreparedImage::new(image);

        let total = self.params.combinations();

        let mut outcome = SearchOutcome {
            combinations_total: total,
            ..Default::default()
        };

        'combinations: for angle in self.params.angles.iter() {
            for scale in self.params.scales.iter() {
                if budget.is_some_and(|b| start.elapsed() > b) {
                    outcome.timed_out = true;
                    break 'combinations;
                }
                outcome.combinations_searched += 1;

                let step_start = Instant::now();
                let Some(tpl) = self.transform_template(template, scale, angle, image.width(), image.height()) else {
                    trace!("skip scale {:.3} angle {:.1}: template out of range", scale, angle);
                    continue;
                };
                let Some(map) = correlate_prepared(&prepared, &tpl, metric) else {
                    continue;
                };

                let before = outcome.matches.len();
                for y in 0..map.height {
                    for x in 0..map.width {
                        let value = map.get(x, y);
                        if metric.passes(value, self.params.threshold) {
                            outcome.matches.push(
                                TemplateMatch::new(x as i32, y as i32, tpl.width() as i32, tpl.height() as i32, metric.to_score(value))
                                    .with_transform(scale, angle),
                            );
                        }
                    }
                }

                trace!(
                    "scale {:.3} angle {:.1}: {} hits in {:?}",
                    scale,
                    angle,
                    outcome.matches.len() - before,
                    step_start.elapsed()
                );
            }
        }

        outcome.elapsed_ms = start.elapsed().as_millis() as u64;
        if outcome.timed_out {
            warn!(
                "template search stopped after {}/{} combinations ({} ms budget)",
                outcome.combinations_searched,
                total,
                self.params.timeout_ms.unwrap_or_default()
            );
        }
        debug!(
            "template search: {} raw matches from {} combinations in {} ms",
            outcome.matches.len(),
            outcome.combinations_searched,
            outcome.elapsed_ms
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{AngleRange, MatchMetric, ScaleRange};

    fn arrow_template() -> GrayImage {
        // bright bar in the top half of a dark square
        GrayImage::from_fn(9, 9, |x, y| Luma([if x == 4 && y < 5 { 255 } else { 0 }]))
    }

    #[test]
    fn test_transform_sizes() {
        let searcher = TemplateSearcher::default();
        let tpl = GrayImage::new(10, 6);

        let half = searcher.transform_template(&tpl, 0.5, 0.0, 100, 100).unwrap();
        assert_eq!(half.dimensions(), (5, 3));

        // 0.4 * 6 = 2.4 -> 2 px, below the 3 px minimum
        assert!(searcher.transform_template(&tpl, 0.4, 0.0, 100, 100).is_none());
        assert!(searcher.transform_template(&tpl, 2.0, 0.0, 15, 100).is_none());
    }

    #[test]
    fn test_rotation_is_clockwise() {
        let searcher = TemplateSearcher::default();
        let rotated = searcher.transform_template(&arrow_template(), 1.0, 90.0, 100, 100).unwrap();
        // the bar now points east from the centre
        assert!(rotated.get_pixel(7, 4)[0] > 200);
        assert!(rotated.get_pixel(1, 4)[0] < 50);
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        let searcher = TemplateSearcher::default();
        assert!(matches!(
            searcher.search(&GrayImage::new(0, 0), &GrayImage::new(3, 3)),
            Err(InputError::EmptyImage { .. })
        ));
        assert!(matches!(
            searcher.search(&GrayImage::new(10, 10), &GrayImage::new(0, 3)),
            Err(InputError::EmptyTemplate { .. })
        ));
    }

    #[test]
    fn test_oversize_is_not_an_error() {
        let searcher = TemplateSearcher::new(SearchParams {
            scales: ScaleRange::additive(1.0, 3.0, 1.0),
            ..Default::default()
        });
        let outcome = searcher.search(&GrayImage::new(12, 12), &arrow_template()).unwrap();
        assert_eq!(outcome.combinations_total, 3);
        assert_eq!(outcome.combinations_searched, 3);
        assert!(!outcome.timed_out);
    }

    #[test]
    fn test_rotated_search_recovers_angle() {
        let mut image = GrayImage::new(40, 40);
        // bar pointing east from (20, 20)
        for x in 20..25 {
            image.put_pixel(x, 20, Luma([255]));
        }

        let searcher = TemplateSearcher::new(SearchParams {
            metric: MatchMetric::CcoeffNormed,
            threshold: 0.9,
            angles: AngleRange::full(90.0),
            ..Default::default()
        });
        let outcome = searcher.search(&image, &arrow_template()).unwrap();
        let best = outcome
            .matches
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(best.angle, 90.0);
        assert_eq!((best.x, best.y), (16, 16));
    }
}
