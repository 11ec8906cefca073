//! Binary morphology with disk structuring elements (L2 norm).
//!
//! Pixels outside the buffer never take part: erosion does not eat in from
//! the border and dilation does not grow out of it.

use super::Mask;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Radii beyond `u8::MAX` saturate
fn kernel_radius(radius: u32) -> u8 {
    u8::try_from(radius).unwrap_or(u8::MAX)
}

fn repeat(image: GrayImage, times: u32, op: impl Fn(&mut GrayImage)) -> GrayImage {
    let mut out = image;
    for _ in 0..times {
        op(&mut out);
    }
    out
}

pub fn erode(mask: &Mask, radius: u32) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    Mask::from_gray(&morphology::erode(&mask.to_gray(), Norm::L2, kernel_radius(radius)))
}

pub fn dilate(mask: &Mask, radius: u32) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    Mask::from_gray(&morphology::dilate(&mask.to_gray(), Norm::L2, kernel_radius(radius)))
}

/// Erosion then dilation, each applied `iterations` times.
/// Radius 0 or zero iterations leaves the mask untouched.
pub fn open(mask: &Mask, radius: u32, iterations: u32) -> Mask {
    if radius == 0 || iterations == 0 {
        return mask.clone();
    }
    let k = kernel_radius(radius);
    let eroded = repeat(mask.to_gray(), iterations, |img| morphology::erode_mut(img, Norm::L2, k));
    Mask::from_gray(&repeat(eroded, iterations, |img| morphology::dilate_mut(img, Norm::L2, k)))
}

/// Dilation then erosion, each applied `iterations` times.
/// Radius 0 or zero iterations leaves the mask untouched.
pub fn close(mask: &Mask, radius: u32, iterations: u32) -> Mask {
    if radius == 0 || iterations == 0 {
        return mask.clone();
    }
    let k = kernel_radius(radius);
    let dilated = repeat(mask.to_gray(), iterations, |img| morphology::dilate_mut(img, Norm::L2, k));
    Mask::from_gray(&repeat(dilated, iterations, |img| morphology::erode_mut(img, Norm::L2, k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilate_is_a_disk() {
        let dot = Mask::from_fn(11, 11, |x, y| x == 5 && y == 5);
        // plus shape
        assert_eq!(dilate(&dot, 1).count(), 5);
        assert_eq!(dilate(&dot, 2).count(), 13);
        assert!(!dilate(&dot, 2).get(3, 3));
    }

    #[test]
    fn test_open_removes_speckle() {
        let mut mask = Mask::from_fn(30, 30, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
        mask.set(25, 25, true);

        let opened = open(&mask, 1, 1);
        assert!(!opened.get(25, 25));
        assert!(opened.get(10, 10));
        // square corners are rounded off by the plus kernel
        assert!(!opened.get(5, 5));
        assert!(opened.get(6, 5));
    }

    #[test]
    fn test_close_fills_hole() {
        let mut mask = Mask::from_fn(20, 20, |x, y| (4..14).contains(&x) && (4..14).contains(&y));
        mask.set(8, 8, false);

        let closed = close(&mask, 1, 1);
        assert!(closed.get(8, 8));
        assert_eq!(closed.count(), 100);
    }

    #[test]
    fn test_zero_radius_is_skipped() {
        let mask = Mask::from_fn(5, 5, |x, y| x == 2 && y == 2);
        assert_eq!(open(&mask, 0, 3), mask);
        assert_eq!(close(&mask, 2, 0), mask);
    }

    #[test]
    fn test_border_is_not_eroded() {
        let mask = Mask::from_fn(6, 6, |_, _| true);
        assert_eq!(erode(&mask, 2).count(), 36);
        assert_eq!(open(&mask, 2, 2).count(), 36);
    }
}
