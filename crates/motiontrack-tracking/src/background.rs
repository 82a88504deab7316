//! Adaptive per-pixel background model and foreground mask extraction.
//!
//! Each pixel keeps a small mixture of Gaussians over RGB values. Every
//! frame updates the mixture with a learning rate of
//! `1 / min(2 * frames_seen, history)`, so early frames adapt fast and the
//! model settles to averaging over `history` frames. A pixel is background
//! when it falls close enough to one of the heavy components that together
//! make up `background_ratio` of the weight.

use crate::morphology::MotionMask;
use image::RgbImage;
use motiontrack_core::{BackgroundParams, MotionError, Result};
use tracing::debug;

/// Structuring square for removing isolated noise pixels.
const OPEN_SIZE: u32 = 3;
/// Structuring square for filling small gaps in moving regions.
const CLOSE_SIZE: u32 = 5;

/// Per-pixel classification produced by [`BackgroundModel::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Background,
    Foreground,
    /// A darker version of the background, not an object.
    Shadow,
}

/// Gaussian-mixture background model over RGB frames.
pub struct BackgroundModel {
    params: BackgroundParams,
    width: u32,
    height: u32,
    /// Active component count per pixel.
    modes_used: Vec<u8>,
    /// `pixel * n_mixtures + mode` indexed.
    weights: Vec<f32>,
    means: Vec<[f32; 3]>,
    variances: Vec<f32>,
    frames_seen: u64,
}

impl BackgroundModel {
    pub fn new(params: BackgroundParams, width: u32, height: u32) -> Result<Self> {
        params.validate()?;
        let pixels = (width * height) as usize;
        let slots = pixels * params.n_mixtures;
        Ok(Self {
            width,
            height,
            modes_used: vec![0; pixels],
            weights: vec![0.0; slots],
            means: vec![[0.0; 3]; slots],
            variances: vec![0.0; slots],
            frames_seen: 0,
            params,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Learning rate that the next call to [`apply`](Self::apply) will use.
    pub fn learning_rate(&self) -> f32 {
        let window = (2 * (self.frames_seen + 1)).min(self.params.history as u64);
        1.0 / window as f32
    }

    /// Classify every pixel of `frame` and fold it into the model.
    pub fn apply(&mut self, frame: &RgbImage) -> Result<Vec<PixelClass>> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(MotionError::Decode(format!(
                "frame is {:?}, background model is {}x{}",
                frame.dimensions(),
                self.width,
                self.height
            )));
        }
        let alpha = self.learning_rate();
        self.frames_seen += 1;

        let classes = frame
            .pixels()
            .enumerate()
            .map(|(idx, px)| {
                let sample = [px.0[0] as f32, px.0[1] as f32, px.0[2] as f32];
                self.update_pixel(idx, sample, alpha)
            })
            .collect();
        Ok(classes)
    }

    fn swap_modes(&mut self, a: usize, b: usize) {
        self.weights.swap(a, b);
        self.means.swap(a, b);
        self.variances.swap(a, b);
    }

    fn update_pixel(&mut self, idx: usize, sample: [f32; 3], alpha: f32) -> PixelClass {
        let p = &self.params;
        let k_max = p.n_mixtures;
        let base = idx * k_max;
        let alpha1 = 1.0 - alpha;
        let prune = -alpha * p.complexity_reduction;
        let (bg_ratio, var_threshold, var_gen) = (p.background_ratio, p.var_threshold, p.var_threshold_gen);
        let (var_min, var_max, var_init) = (p.var_min, p.var_max, p.var_init);

        let mut n_modes = self.modes_used[idx] as usize;
        let mut background = false;
        let mut fits = false;
        let mut total_weight = 0.0f32;

        for mode in 0..n_modes {
            let slot = base + mode;
            let mut weight = alpha1 * self.weights[slot] + prune;
            let mut dest = slot;

            if !fits {
                let var = self.variances[slot];
                let mean = self.means[slot];
                let diff = [mean[0] - sample[0], mean[1] - sample[1], mean[2] - sample[2]];
                let dist2 = diff[0] * diff[0] + diff[1] * diff[1] + diff[2] * diff[2];

                if total_weight < bg_ratio && dist2 < var_threshold * var {
                    background = true;
                }

                if dist2 < var_gen * var {
                    fits = true;
                    weight += alpha;
                    let k = alpha / weight;
                    self.means[slot] = [
                        mean[0] - k * diff[0],
                        mean[1] - k * diff[1],
                        mean[2] - k * diff[2],
                    ];
                    self.variances[slot] = (var + k * (dist2 - var)).clamp(var_min, var_max);

                    // Keep components sorted by descending weight.
                    let mut i = mode;
                    while i > 0 && weight >= self.weights[base + i - 1] {
                        self.swap_modes(base + i, base + i - 1);
                        i -= 1;
                    }
                    dest = base + i;
                }
            }

            let weight = if weight < -prune { 0.0 } else { weight };
            self.weights[dest] = weight;
            total_weight += weight;
        }

        // Drop components whose weight decayed to nothing.
        let mut kept = 0;
        for mode in 0..n_modes {
            if self.weights[base + mode] > 0.0 {
                if kept != mode {
                    self.swap_modes(base + kept, base + mode);
                }
                kept += 1;
            }
        }
        n_modes = kept;

        if total_weight > 0.0 {
            let norm = 1.0 / total_weight;
            for w in &mut self.weights[base..base + n_modes] {
                *w *= norm;
            }
        }

        if !fits {
            let mode = if n_modes == k_max {
                k_max - 1
            } else {
                n_modes += 1;
                n_modes - 1
            };
            if n_modes == 1 {
                self.weights[base + mode] = 1.0;
            } else {
                self.weights[base + mode] = alpha;
                for w in &mut self.weights[base..base + n_modes - 1] {
                    *w *= alpha1;
                }
            }
            self.means[base + mode] = sample;
            self.variances[base + mode] = var_init;

            let mut i = n_modes - 1;
            while i > 0 && alpha >= self.weights[base + i - 1] {
                self.swap_modes(base + i, base + i - 1);
                i -= 1;
            }
        }

        self.modes_used[idx] = n_modes as u8;

        if background {
            PixelClass::Background
        } else if self.params.detect_shadows && self.is_shadow(base, n_modes, sample) {
            PixelClass::Shadow
        } else {
            PixelClass::Foreground
        }
    }

    /// A sample is a shadow when it is a uniformly darkened copy of one of
    /// the background components.
    fn is_shadow(&self, base: usize, n_modes: usize, sample: [f32; 3]) -> bool {
        let p = &self.params;
        let mut weight_sum = 0.0;
        for mode in 0..n_modes {
            let slot = base + mode;
            let mean = self.means[slot];
            let var = self.variances[slot];

            let numerator: f32 = (0..3).map(|c| sample[c] * mean[c]).sum();
            let denominator: f32 = (0..3).map(|c| mean[c] * mean[c]).sum();
            if denominator == 0.0 {
                return false;
            }

            if numerator <= denominator && numerator >= p.shadow_tau * denominator {
                let a = numerator / denominator;
                let dist2a: f32 = (0..3).map(|c| (a * mean[c] - sample[c]).powi(2)).sum();
                if dist2a < p.var_threshold * var * a * a {
                    return true;
                }
            }

            weight_sum += self.weights[slot];
            if weight_sum > p.background_ratio {
                return false;
            }
        }
        false
    }
}

/// Turns color frames into cleaned-up foreground masks.
///
/// Owns the background model; the model is sized from the first frame and
/// rebuilt if the frame size ever changes.
pub struct MotionDetector {
    params: BackgroundParams,
    model: Option<BackgroundModel>,
}

impl MotionDetector {
    pub fn new(params: BackgroundParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            model: None,
        })
    }

    pub fn model(&self) -> Option<&BackgroundModel> {
        self.model.as_ref()
    }

    /// Update the background model with `frame` and return its foreground
    /// mask after opening (3x3) and then closing (5x5).
    pub fn detect(&mut self, frame: &RgbImage) -> Result<MotionMask> {
        let (w, h) = frame.dimensions();
        let model = match self.model.take() {
            Some(model) if model.dimensions() == (w, h) => model,
            _ => {
                debug!(width = w, height = h, "Initializing background model");
                BackgroundModel::new(self.params.clone(), w, h)?
            }
        };
        let model = self.model.insert(model);
        let classes = model.apply(frame)?;

        let mut raw = MotionMask::new(w, h);
        for (i, class) in classes.iter().enumerate() {
            if *class == PixelClass::Foreground {
                raw.set(i as u32 % w, i as u32 / w, true);
            }
        }
        Ok(raw.open(OPEN_SIZE).close(CLOSE_SIZE))
    }
}
