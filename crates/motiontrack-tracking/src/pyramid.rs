//! Image pyramid utilities for multi-scale tracking.

use motiontrack_core::GrayImage;

/// 5-tap binomial kernel used for the Gaussian pyramid.
const PYR_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Blur with the 5x5 Gaussian and keep every second pixel.
///
/// The result is `ceil(w / 2)` x `ceil(h / 2)`.
pub fn pyr_down(img: &GrayImage) -> GrayImage {
    let nw = img.width.div_ceil(2);
    let nh = img.height.div_ceil(2);

    // Horizontal pass at the decimated columns, full height.
    let mut rows = GrayImage::new(nw, img.height);
    for y in 0..img.height as i32 {
        for x in 0..nw as i32 {
            let sx = x * 2;
            let mut acc = 0.0;
            for (k, w) in PYR_KERNEL.iter().enumerate() {
                acc += w * img.get(sx + k as i32 - 2, y);
            }
            rows.set(x as u32, y as u32, acc);
        }
    }

    let mut out = GrayImage::new(nw, nh);
    for y in 0..nh as i32 {
        let sy = y * 2;
        for x in 0..nw as i32 {
            let mut acc = 0.0;
            for (k, w) in PYR_KERNEL.iter().enumerate() {
                acc += w * rows.get(x, sy + k as i32 - 2);
            }
            out.set(x as u32, y as u32, acc);
        }
    }
    out
}

/// Multi-scale image pyramid. Level 0 is the input image.
pub struct ImagePyramid {
    pub levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Build up to `max_level + 1` levels.
    ///
    /// Coarsening stops early once a level would be no larger than
    /// `min_side` in either dimension, so a search window always fits.
    pub fn build(gray: &GrayImage, max_level: u32, min_side: u32) -> Self {
        let mut levels = vec![gray.clone()];
        for _ in 0..max_level {
            let Some(prev) = levels.last() else { break };
            if prev.width.div_ceil(2) <= min_side || prev.height.div_ceil(2) <= min_side {
                break;
            }
            let next = pyr_down(prev);
            levels.push(next);
        }
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Spatial gradients (Ix, Iy) using the 3x3 Scharr operator, normalized to
/// intensity units per pixel.
pub fn scharr_gradients(img: &GrayImage) -> (GrayImage, GrayImage) {
    let mut ix = GrayImage::new(img.width, img.height);
    let mut iy = GrayImage::new(img.width, img.height);
    for y in 0..img.height as i32 {
        for x in 0..img.width as i32 {
            let gx = 3.0 * (img.get(x + 1, y - 1) - img.get(x - 1, y - 1))
                + 10.0 * (img.get(x + 1, y) - img.get(x - 1, y))
                + 3.0 * (img.get(x + 1, y + 1) - img.get(x - 1, y + 1));
            let gy = 3.0 * (img.get(x - 1, y + 1) - img.get(x - 1, y - 1))
                + 10.0 * (img.get(x, y + 1) - img.get(x, y - 1))
                + 3.0 * (img.get(x + 1, y + 1) - img.get(x + 1, y - 1));
            ix.set(x as u32, y as u32, gx / 32.0);
            iy.set(x as u32, y as u32, gy / 32.0);
        }
    }
    (ix, iy)
}
