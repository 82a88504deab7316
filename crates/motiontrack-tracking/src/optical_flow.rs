//! Pyramidal Lucas-Kanade optical flow for sparse points.

use crate::pyramid::{scharr_gradients, ImagePyramid};
use glam::Vec2;
use motiontrack_core::{FlowParams, GrayImage, Result};
use serde::{Deserialize, Serialize};

/// Gradient products are reported in 8-bit fixed-point units scaled down by
/// 2^10, which is the scale `min_eigen_threshold` is expressed in.
const GRADIENT_SCALE: f32 = 1.0 / 1024.0;

/// Oscillation guard: two consecutive corrections that nearly cancel.
const OSCILLATION_LIMIT: f32 = 0.01;

/// Outcome of tracking one point from the previous frame into the current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPoint {
    pub previous: Vec2,
    pub position: Vec2,
    pub success: bool,
}

impl TrackedPoint {
    /// Euclidean distance between the previous and the tracked position.
    pub fn displacement(&self) -> f32 {
        self.previous.distance(self.position)
    }
}

/// Sparse Lucas-Kanade tracker run coarse to fine over Gaussian pyramids.
#[derive(Debug, Clone)]
pub struct OpticalFlowTracker {
    params: FlowParams,
}

/// Per-level data of the previous frame shared by every tracked point.
struct LevelData<'a> {
    prev: &'a GrayImage,
    curr: &'a GrayImage,
    grad_x: GrayImage,
    grad_y: GrayImage,
}

impl OpticalFlowTracker {
    pub fn new(params: FlowParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    /// Track `points` (coordinates in `prev`) into `curr`.
    ///
    /// The result has one entry per input point, in input order.
    pub fn track(&self, prev: &GrayImage, curr: &GrayImage, points: &[Vec2]) -> Vec<TrackedPoint> {
        if points.is_empty() {
            return Vec::new();
        }
        let win = self.params.win_size;
        let prev_pyr = ImagePyramid::build(prev, self.params.max_level, win);
        let curr_pyr = ImagePyramid::build(curr, self.params.max_level, win);
        let depth = prev_pyr.len().min(curr_pyr.len());

        let levels: Vec<LevelData<'_>> = (0..depth)
            .map(|l| {
                let (grad_x, grad_y) = scharr_gradients(&prev_pyr.levels[l]);
                LevelData {
                    prev: &prev_pyr.levels[l],
                    curr: &curr_pyr.levels[l],
                    grad_x,
                    grad_y,
                }
            })
            .collect();

        points
            .iter()
            .map(|&p| {
                let tracked = self.track_point(&levels, p);
                let position = tracked.map_or(p, |d| p + d);
                TrackedPoint {
                    previous: p,
                    position,
                    success: tracked.is_some() && curr.contains(position.x, position.y),
                }
            })
            .collect()
    }

    /// Displacement of `point` in level-0 pixels, or `None` when it cannot
    /// be tracked.
    fn track_point(&self, levels: &[LevelData<'_>], point: Vec2) -> Option<Vec2> {
        let half = (self.params.win_size / 2) as i32;
        let area = (self.params.win_size * self.params.win_size) as f32;
        let eps_sq = self.params.epsilon * self.params.epsilon;

        let window_len = (2 * half + 1) as usize;
        let mut patch = Vec::with_capacity(window_len * window_len);
        let mut guess = Vec2::ZERO;

        for (level, data) in levels.iter().enumerate().rev() {
            let p = point / (1u32 << level) as f32;

            if !data.prev.contains(p.x, p.y) {
                if level == 0 {
                    return None;
                }
                guess *= 2.0;
                continue;
            }

            patch.clear();
            let (mut a11, mut a12, mut a22) = (0.0f32, 0.0f32, 0.0f32);
            for wy in -half..=half {
                for wx in -half..=half {
                    let (sx, sy) = (p.x + wx as f32, p.y + wy as f32);
                    let ival = data.prev.sample(sx, sy);
                    let gx = data.grad_x.sample(sx, sy);
                    let gy = data.grad_y.sample(sx, sy);
                    a11 += gx * gx;
                    a12 += gx * gy;
                    a22 += gy * gy;
                    patch.push((ival, gx, gy));
                }
            }
            a11 *= GRADIENT_SCALE;
            a12 *= GRADIENT_SCALE;
            a22 *= GRADIENT_SCALE;

            let det = a11 * a22 - a12 * a12;
            let min_eig = (a11 + a22 - ((a11 - a22) * (a11 - a22) + 4.0 * a12 * a12).sqrt())
                / (2.0 * area);
            if min_eig < self.params.min_eigen_threshold || det < f32::EPSILON {
                if level == 0 {
                    return None;
                }
                guess *= 2.0;
                continue;
            }

            let mut d = guess;
            let mut prev_delta = Vec2::ZERO;
            for j in 0..self.params.max_iterations {
                let q = p + d;
                let (mut b1, mut b2) = (0.0f32, 0.0f32);
                let mut k = 0;
                for wy in -half..=half {
                    for wx in -half..=half {
                        let (ival, gx, gy) = patch[k];
                        k += 1;
                        let diff = data.curr.sample(q.x + wx as f32, q.y + wy as f32) - ival;
                        b1 += diff * gx;
                        b2 += diff * gy;
                    }
                }
                b1 *= GRADIENT_SCALE;
                b2 *= GRADIENT_SCALE;

                let delta = Vec2::new((a12 * b2 - a22 * b1) / det, (a12 * b1 - a11 * b2) / det);
                d += delta;

                if delta.length_squared() <= eps_sq {
                    break;
                }
                if j > 0 && (delta + prev_delta).length() < OSCILLATION_LIMIT {
                    d -= delta * 0.5;
                    break;
                }
                prev_delta = delta;
            }

            guess = if level > 0 { d * 2.0 } else { d };
        }

        Some(guess)
    }
}
