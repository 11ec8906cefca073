use image::{GrayImage, Luma};
use markscan_cv::template::{AngleRange, MatchMetric, ScaleRange, SearchParams, TemplateSearcher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(width, height, |_, _| Luma([rng.gen_range(0..=255u8)]))
}

#[test]
fn test_exact_subregion_is_found() {
    let _ = env_logger::builder().is_test(true).try_init();
    let image = noise(60, 40, 7);
    let template = image::imageops::crop_imm(&image, 17, 11, 12, 10).to_image();

    let searcher = TemplateSearcher::new(SearchParams {
        metric: MatchMetric::CcoeffNormed,
        threshold: 0.9,
        ..Default::default()
    });
    let outcome = searcher.search(&image, &template).unwrap();

    assert!(!outcome.timed_out);
    assert_eq!(outcome.combinations_searched, 1);
    let hit = outcome.matches.iter().find(|m| m.x == 17 && m.y == 11).unwrap();
    assert!(hit.score >= 0.99);
    assert_eq!((hit.width, hit.height), (12, 10));
}

#[test]
fn test_timeout_returns_partial_result() {
    let _ = env_logger::builder().is_test(true).try_init();
    let image = noise(64, 64, 11);
    let template = noise(8, 8, 12);

    let searcher = TemplateSearcher::new(SearchParams {
        metric: MatchMetric::CcoeffNormed,
        threshold: 0.9,
        scales: ScaleRange::additive(1.0, 2.0, 0.1),
        angles: AngleRange::full(1.0),
        timeout_ms: Some(1),
        ..Default::default()
    });

    let start = Instant::now();
    let outcome = searcher.search(&image, &template).unwrap();
    let elapsed = start.elapsed();

    assert!(outcome.timed_out);
    assert_eq!(outcome.combinations_total, 360 * 11);
    assert!(outcome.combinations_searched < outcome.combinations_total);
    // one combination past the budget at most
    assert!(elapsed < Duration::from_millis(50), "took {:?}", elapsed);
}

#[test]
fn test_timeout_with_tiny_steps_returns_promptly() {
    let _ = env_logger::builder().is_test(true).try_init();
    let image = noise(64, 64, 21);
    let template = noise(8, 8, 22);

    let searcher = TemplateSearcher::new(SearchParams {
        metric: MatchMetric::CcoeffNormed,
        threshold: 0.9,
        scales: ScaleRange::additive(1.0, 2.0, 1e-7),
        angles: AngleRange::new(0.0, 360.0, 1e-5),
        timeout_ms: Some(1),
        ..Default::default()
    });

    let start = Instant::now();
    let outcome = searcher.search(&image, &template).unwrap();
    let elapsed = start.elapsed();

    assert!(outcome.timed_out);
    assert!(outcome.combinations_total > 300_000_000_000_000);
    assert!(outcome.combinations_searched >= 1);
    assert!(elapsed < Duration::from_millis(50), "took {:?}", elapsed);
}
