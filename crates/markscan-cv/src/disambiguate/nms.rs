//! Greedy score-ordered suppression of overlapping matches.

use markscan_core::TemplateMatch;
use std::cmp::Ordering;

/// Stable sort, highest score first. Ties keep their input order.
pub fn sort_by_score(matches: &mut [TemplateMatch]) {
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Generic greedy pass: keep the best remaining match, drop everything
/// `conflicts` with it, repeat.
fn greedy(mut matches: Vec<TemplateMatch>, conflicts: impl Fn(&TemplateMatch, &TemplateMatch) -> bool) -> Vec<TemplateMatch> {
    sort_by_score(&mut matches);

    let mut suppressed = vec![false; matches.len()];
    let mut keep = Vec::new();

    for i in 0..matches.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..matches.len() {
            if !suppressed[j] && conflicts(&matches[i], &matches[j]) {
                suppressed[j] = true;
            }
        }
        keep.push(i);
    }

    let mut slots: Vec<Option<TemplateMatch>> = matches.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Classic NMS: discards every match whose IoU with a better kept match
/// exceeds `overlap_threshold`.
pub fn suppress(matches: Vec<TemplateMatch>, overlap_threshold: f64) -> Vec<TemplateMatch> {
    greedy(matches, |kept, other| kept.iou(other) > overlap_threshold)
}

/// Suppression by centre distance: two matches conflict when their centres
/// are closer than `ratio` times their mean width.
pub fn suppress_by_distance(matches: Vec<TemplateMatch>, ratio: f64) -> Vec<TemplateMatch> {
    greedy(matches, |kept, other| {
        let avg_width = (kept.width + other.width) as f64 / 2.0;
        kept.center().distance(&other.center()) < avg_width * ratio
    })
}
