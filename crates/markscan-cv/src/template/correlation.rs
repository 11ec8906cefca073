//! Sliding-window similarity between a grayscale image and a template.
//!
//! The plain correlation and squared-difference metrics come from
//! `imageproc::template_matching`. The correlation coefficient pair is
//! computed here: window sums come from integral images, so only the cross
//! term costs a full pass over the template at every placement.

use super::MatchMetric;
use image::GrayImage;
use imageproc::template_matching::MatchTemplateMethod;

/// Grayscale image with its integral tables, reused across templates
#[derive(Debug, Clone)]
pub struct PreparedImage {
    source: GrayImage,
    width: usize,
    height: usize,
    pixels: Vec<f64>,
    /// `(width + 1) * (height + 1)` running sums
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PreparedImage {
    pub fn new(image: &GrayImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let pixels: Vec<f64> = image.as_raw().iter().map(|&v| v as f64).collect();

        let stride = width + 1;
        let mut sum = vec![0.0; stride * (height + 1)];
        let mut sum_sq = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for x in 0..width {
                let v = pixels[y * width + x];
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sq;
            }
        }

        Self {
            source: image.clone(),
            width,
            height,
            pixels,
            sum,
            sum_sq,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn window(table: &[f64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> f64 {
        table[(y + h) * stride + x + w] - table[y * stride + x + w] - table[(y + h) * stride + x] + table[y * stride + x]
    }
}

/// Template pixels with their totals
#[derive(Debug, Clone)]
struct PreparedTemplate {
    width: usize,
    height: usize,
    pixels: Vec<f64>,
    sum: f64,
    sum_sq: f64,
}

impl PreparedTemplate {
    fn new(template: &GrayImage) -> Self {
        let pixels: Vec<f64> = template.as_raw().iter().map(|&v| v as f64).collect();
        Self {
            width: template.width() as usize,
            height: template.height() as usize,
            sum: pixels.iter().sum(),
            sum_sq: pixels.iter().map(|v| v * v).sum(),
            pixels,
        }
    }
}

/// Metric values for every placement, `(image_w - tw + 1) x (image_h - th + 1)`
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMap {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl ScoreMap {
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    /// Position and value of the highest entry
    pub fn max(&self) -> Option<(usize, usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, v)| (i % self.width, i / self.width, v))
    }

    /// Position and value of the lowest entry
    pub fn min(&self) -> Option<(usize, usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, bv)) if bv <= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, v)| (i % self.width, i / self.width, v))
    }
}

const EPS: f64 = 1e-9;

/// `Ccoeff` or `CcoeffNormed` at one placement
fn coefficient_at(image: &PreparedImage, tpl: &PreparedTemplate, metric: MatchMetric, x: usize, y: usize) -> f64 {
    let stride = image.width + 1;
    let n = (tpl.width * tpl.height) as f64;

    let mut cross = 0.0;
    for ty in 0..tpl.height {
        let img_row = &image.pixels[(y + ty) * image.width + x..][..tpl.width];
        let tpl_row = &tpl.pixels[ty * tpl.width..][..tpl.width];
        cross += img_row.iter().zip(tpl_row).map(|(a, b)| a * b).sum::<f64>();
    }

    let win_sum = PreparedImage::window(&image.sum, stride, x, y, tpl.width, tpl.height);
    let win_sq = PreparedImage::window(&image.sum_sq, stride, x, y, tpl.width, tpl.height);

    let num = cross - win_sum * tpl.sum / n;
    if metric == MatchMetric::Ccoeff {
        return num;
    }

    let var_img = (win_sq - win_sum * win_sum / n).max(0.0);
    let var_tpl = (tpl.sum_sq - tpl.sum * tpl.sum / n).max(0.0);
    let denom = (var_img * var_tpl).sqrt();
    if denom <= EPS { 0.0 } else { (num / denom).clamp(-1.0, 1.0) }
}

fn score_row(image: &PreparedImage, tpl: &PreparedTemplate, metric: MatchMetric, y: usize, cols: usize) -> Vec<f64> {
    (0..cols).map(|x| coefficient_at(image, tpl, metric, x, y)).collect()
}

/// Scores every placement of `template` over a prepared image.
///
/// `None` when the template is empty or does not fit.
pub fn correlate_prepared(image: &PreparedImage, template: &GrayImage, metric: MatchMetric) -> Option<ScoreMap> {
    let tpl = PreparedTemplate::new(template);
    if tpl.width == 0 || tpl.height == 0 || tpl.width > image.width || tpl.height > image.height {
        return None;
    }

    let cols = image.width - tpl.width + 1;
    let rows = image.height - tpl.height + 1;

    let library_method = match metric {
        MatchMetric::Ccorr => Some(MatchTemplateMethod::CrossCorrelation),
        MatchMetric::CcorrNormed => Some(MatchTemplateMethod::CrossCorrelationNormalized),
        MatchMetric::Sqdiff => Some(MatchTemplateMethod::SumOfSquaredErrors),
        MatchMetric::SqdiffNormed => Some(MatchTemplateMethod::SumOfSquaredErrorsNormalized),
        MatchMetric::Ccoeff | MatchMetric::CcoeffNormed => None,
    };

    if let Some(method) = library_method {
        #[cfg(feature = "parallel")]
        let map = imageproc::template_matching::match_template_parallel(&image.source, template, method);
        #[cfg(not(feature = "parallel"))]
        let map = imageproc::template_matching::match_template(&image.source, template, method);

        // a flat window or template leaves 0/0 in the normalized maps
        let worst = if metric.is_inverted() { 1.0 } else { 0.0 };
        let values = map
            .as_raw()
            .iter()
            .map(|&v| if v.is_finite() { v as f64 } else { worst })
            .collect();
        return Some(ScoreMap {
            width: cols,
            height: rows,
            values,
        });
    }

    #[cfg(feature = "parallel")]
    let values: Vec<f64> = {
        use rayon::prelude::*;
        (0..rows)
            .into_par_iter()
            .map(|y| score_row(image, &tpl, metric, y, cols))
            .collect::<Vec<_>>()
            .concat()
    };

    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = (0..rows).flat_map(|y| score_row(image, &tpl, metric, y, cols)).collect();

    Some(ScoreMap {
        width: cols,
        height: rows,
        values,
    })
}

/// One-shot correlation of `template` over `image`
pub fn correlate(image: &GrayImage, template: &GrayImage, metric: MatchMetric) -> Option<ScoreMap> {
    correlate_prepared(&PreparedImage::new(image), template, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13 + (x * y) % 11) % 256) as u8]))
    }

    fn crop(image: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        image::imageops::crop_imm(image, x, y, w, h).to_image()
    }

    #[test]
    fn test_exact_patch_peaks() {
        let image = gradient(40, 30);
        let template = crop(&image, 12, 9, 8, 6);

        let coeff = correlate(&image, &template, MatchMetric::CcoeffNormed).unwrap();
        assert_eq!((coeff.width, coeff.height), (33, 25));
        assert_relative_eq!(coeff.get(12, 9), 1.0, epsilon = 1e-9);

        // single precision in the library maps
        let ccorr = correlate(&image, &template, MatchMetric::CcorrNormed).unwrap();
        assert_eq!((ccorr.width, ccorr.height), (33, 25));
        assert_relative_eq!(ccorr.get(12, 9), 1.0, epsilon = 1e-4);

        let sq = correlate(&image, &template, MatchMetric::Sqdiff).unwrap();
        assert_eq!(sq.min().map(|(x, y, _)| (x, y)), Some((12, 9)));
        assert_relative_eq!(sq.get(12, 9), 0.0, epsilon = 1e-6);

        let sqn = correlate(&image, &template, MatchMetric::SqdiffNormed).unwrap();
        assert_relative_eq!(sqn.get(12, 9), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ccoeff_peak_location() {
        let image = gradient(40, 30);
        let template = crop(&image, 3, 17, 9, 9);
        let map = correlate(&image, &template, MatchMetric::CcoeffNormed).unwrap();
        let (x, y, v) = map.max().unwrap();
        assert_eq!((x, y), (3, 17));
        assert_relative_eq!(v, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_regions_score_zero() {
        let image = GrayImage::from_pixel(10, 10, Luma([50]));
        let template = GrayImage::from_pixel(3, 3, Luma([50]));
        let map = correlate(&image, &template, MatchMetric::CcoeffNormed).unwrap();
        assert!(map.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_black_window_is_worst_for_sqdiff_normed() {
        let image = GrayImage::new(10, 10);
        let template = GrayImage::from_pixel(3, 3, Luma([80]));
        let map = correlate(&image, &template, MatchMetric::SqdiffNormed).unwrap();
        assert!(map.values.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_oversize_template() {
        let image = GrayImage::new(5, 5);
        assert!(correlate(&image, &GrayImage::new(6, 2), MatchMetric::Ccorr).is_none());
        assert!(correlate(&image, &GrayImage::new(0, 0), MatchMetric::Ccorr).is_none());
    }
}
