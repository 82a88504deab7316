//! Corner selection restricted to moving regions.

use crate::morphology::MotionMask;
use glam::Vec2;
use motiontrack_core::{FeatureParams, GrayImage, Result};

/// Picks well-textured corners inside a motion mask.
///
/// Corner strength is the smaller eigenvalue of the gradient covariance
/// summed over a `block_size` window. A pixel qualifies when it is a 3x3
/// local maximum, lies inside the mask, and reaches `quality_level` times
/// the strongest response found inside the mask. Qualifying corners are
/// taken strongest first, skipping any closer than `min_distance` to one
/// already taken, until `max_corners` are collected.
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    params: FeatureParams,
}

impl FeatureSelector {
    pub fn new(params: FeatureParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Minimum-eigenvalue corner response for every pixel.
    pub fn corner_response(&self, gray: &GrayImage) -> GrayImage {
        let (w, h) = gray.dimensions();
        let mut dxx = GrayImage::new(w, h);
        let mut dxy = GrayImage::new(w, h);
        let mut dyy = GrayImage::new(w, h);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let gx = (gray.get(x + 1, y - 1) - gray.get(x - 1, y - 1))
                    + 2.0 * (gray.get(x + 1, y) - gray.get(x - 1, y))
                    + (gray.get(x + 1, y + 1) - gray.get(x - 1, y + 1));
                let gy = (gray.get(x - 1, y + 1) - gray.get(x - 1, y - 1))
                    + 2.0 * (gray.get(x, y + 1) - gray.get(x, y - 1))
                    + (gray.get(x + 1, y + 1) - gray.get(x + 1, y - 1));
                let (ux, uy) = (x as u32, y as u32);
                dxx.set(ux, uy, gx * gx);
                dxy.set(ux, uy, gx * gy);
                dyy.set(ux, uy, gy * gy);
            }
        }

        let block = self.params.block_size;
        let a = box_sum(&dxx, block);
        let b = box_sum(&dxy, block);
        let c = box_sum(&dyy, block);

        let mut response = GrayImage::new(w, h);
        for (i, out) in response.data.iter_mut().enumerate() {
            let (a, b, c) = (a.data[i], b.data[i], c.data[i]);
            *out = ((a + c) - ((a - c) * (a - c) + 4.0 * b * b).sqrt()) * 0.5;
        }
        response
    }

    /// Select corners of `gray` that lie inside `mask`.
    pub fn select(&self, gray: &GrayImage, mask: &MotionMask) -> Vec<Vec2> {
        if mask.is_empty() || gray.width < 3 || gray.height < 3 {
            return Vec::new();
        }
        let response = self.corner_response(gray);
        let (w, h) = response.dimensions();

        let mut best = 0.0f32;
        for y in 0..h {
            for x in 0..w {
                if mask.get(x, y) {
                    best = best.max(response.data[(y * w + x) as usize]);
                }
            }
        }
        if best <= 0.0 {
            return Vec::new();
        }
        let threshold = self.params.quality_level * best;

        let mut candidates = Vec::new();
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                if !mask.get(x, y) {
                    continue;
                }
                let q = response.data[(y * w + x) as usize];
                if q <= 0.0 || q < threshold || !is_local_max(&response, x as i32, y as i32, q) {
                    continue;
                }
                candidates.push((q, Vec2::new(x as f32, y as f32)));
            }
        }
        // Stable: equal responses keep raster order.
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let min_dist_sq = self.params.min_distance * self.params.min_distance;
        let mut accepted: Vec<Vec2> = Vec::with_capacity(self.params.max_corners);
        for (_, point) in candidates {
            if accepted.len() >= self.params.max_corners {
                break;
            }
            if accepted.iter().all(|p| p.distance_squared(point) >= min_dist_sq) {
                accepted.push(point);
            }
        }
        accepted
    }
}

fn is_local_max(img: &GrayImage, x: i32, y: i32, q: f32) -> bool {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if (dx != 0 || dy != 0) && img.get(x + dx, y + dy) > q {
                return false;
            }
        }
    }
    true
}

/// Unnormalized sum over a `size` x `size` window. Pixels outside the image
/// contribute nothing.
fn box_sum(img: &GrayImage, size: u32) -> GrayImage {
    let lo = (size / 2) as i32;
    let hi = size as i32 - 1 - lo;
    let (w, h) = (img.width as i32, img.height as i32);

    let mut rows = GrayImage::new(img.width, img.height);
    for y in 0..h {
        for x in 0..w {
            let acc: f32 = ((x - lo).max(0)..=(x + hi).min(w - 1))
                .map(|sx| img.data[(y * w + sx) as usize])
                .sum();
            rows.data[(y * w + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(img.width, img.height);
    for y in 0..h {
        for x in 0..w {
            let acc: f32 = ((y - lo).max(0)..=(y + hi).min(h - 1))
                .map(|sy| rows.data[(sy * w + x) as usize])
                .sum();
            out.data[(y * w + x) as usize] = acc;
        }
    }
    out
}
