//! Frame buffers handed from the decoder to the tracking stages.
//!
//! A [`Frame`] pairs the scaled color image with its grayscale conversion.
//! Grayscale intensities are stored as `f32` in `[0, 255]`.

use image::{imageops::FilterType, RgbImage};

/// A single-channel image with `f32` intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl GrayImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; (width * height) as usize],
            width,
            height,
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Pixel read with clamp-to-edge addressing.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, val: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }

    /// Bilinear sample at a sub-pixel position, clamped to the image edge.
    #[inline]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);
        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x0 + 1, y0) * fx;
        let bottom = self.get(x0, y0 + 1) * (1.0 - fx) + self.get(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= (self.width - 1) as f32 && y <= (self.height - 1) as f32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Convert an RGB image to grayscale using BT.601 luma weights.
///
/// Results are rounded to whole intensities so they match an 8-bit
/// grayscale conversion.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (i, px) in rgb.pixels().enumerate() {
        let [r, g, b] = px.0;
        gray.data[i] = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round();
    }
    gray
}

/// Output dimensions for a source of `width` x `height` scaled by `scale`.
///
/// Each side is `round(dim * scale)`, never smaller than one pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64) * scale).round().max(1.0) as u32;
    let h = ((height as f64) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Resize with bilinear (triangle) filtering. A scale of 1 returns a copy.
pub fn scale_rgb(rgb: &RgbImage, scale: f64) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let (nw, nh) = scaled_dimensions(w, h, scale);
    if (nw, nh) == (w, h) {
        return rgb.clone();
    }
    image::imageops::resize(rgb, nw, nh, FilterType::Triangle)
}

/// A decoded, scaled frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based position in the decoded stream.
    pub index: u64,
    pub color: RgbImage,
    pub gray: GrayImage,
}

impl Frame {
    /// Scale a raw decoded image and derive its grayscale copy.
    pub fn from_rgb(index: u64, raw: &RgbImage, scale: f64) -> Self {
        let color = scale_rgb(raw, scale);
        let gray = rgb_to_gray(&color);
        Self { index, color, gray }
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }
}
