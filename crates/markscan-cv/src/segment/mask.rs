use image::{GrayImage, Luma};
use markscan_core::{Point, Rect};

/// Binary foreground/background buffer, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// All-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Any non-zero pixel is foreground
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().iter().map(|&v| v != 0).collect(),
        }
    }

    /// Foreground as 255, background as 0
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([if self.get(x, y) { 255 } else { 0 }]))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.index(x, y)]
    }

    /// Signed lookup; anything outside the buffer is background
    pub fn at(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.get(x as u32, y as u32)
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data[i] = value;
        }
    }

    /// Number of foreground pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Foreground pixels inside `rect`, clipped to the mask
    pub fn count_in(&self, rect: &Rect) -> usize {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.right().min(self.width as i32);
        let y1 = rect.bottom().min(self.height as i32);

        let mut count = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.at(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Pixel-wise OR with a mask of the same size; mismatched sizes are ignored.
    pub fn union_with(&mut self, other: &Mask) {
        if other.width != self.width || other.height != self.height {
            return;
        }
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a |= b;
        }
    }

    /// Foreground pixel coordinates in raster order
    pub fn foreground(&self) -> impl Iterator<Item = Point> + '_ {
        let width = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(move |(i, _)| Point::new((i % width) as i32, (i / width) as i32))
    }
}
