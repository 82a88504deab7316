//! Tracking and analysis configuration.
//!
//! Every tuning knob is a named, typed field with a documented default.
//! Configurations are validated before any component is built from them.

use crate::error::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Corner selection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Maximum number of corners returned per frame (default: 50).
    pub max_corners: usize,
    /// Minimum accepted quality relative to the best corner (default: 0.5).
    pub quality_level: f32,
    /// Minimum Euclidean distance between accepted corners in pixels (default: 15).
    pub min_distance: f32,
    /// Side of the gradient covariance window (default: 9).
    pub block_size: u32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            max_corners: 50,
            quality_level: 0.5,
            min_distance: 15.0,
            block_size: 9,
        }
    }
}

/// Pyramidal Lucas-Kanade parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Side of the square search window, must be odd (default: 21).
    pub win_size: u32,
    /// Index of the coarsest pyramid level; `max_level + 1` levels are built (default: 3).
    pub max_level: u32,
    /// Iteration cap per pyramid level (default: 20).
    pub max_iterations: u32,
    /// Stop iterating once the correction is shorter than this (default: 0.01).
    pub epsilon: f32,
    /// Minimum normalized eigenvalue of the gradient matrix (default: 1e-4).
    pub min_eigen_threshold: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            win_size: 21,
            max_level: 3,
            max_iterations: 20,
            epsilon: 0.01,
            min_eigen_threshold: 1e-4,
        }
    }
}

/// Adaptive Gaussian-mixture background model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundParams {
    /// Number of frames the learning rate averages over (default: 500).
    pub history: u32,
    /// Squared Mahalanobis distance deciding background membership (default: 16).
    pub var_threshold: f32,
    /// Classify and drop shadow pixels (default: true).
    pub detect_shadows: bool,
    /// Maximum Gaussian components per pixel (default: 5).
    pub n_mixtures: usize,
    /// Weight share of components treated as background (default: 0.9).
    pub background_ratio: f32,
    /// Squared distance under which a sample updates an existing component (default: 9).
    pub var_threshold_gen: f32,
    /// Variance of a freshly created component (default: 15).
    pub var_init: f32,
    /// Lower variance clamp (default: 4).
    pub var_min: f32,
    /// Upper variance clamp (default: 75).
    pub var_max: f32,
    /// Prior pushing unused components out of the model (default: 0.05).
    pub complexity_reduction: f32,
    /// Darkest brightness ratio still considered a shadow (default: 0.5).
    pub shadow_tau: f32,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 16.0,
            detect_shadows: true,
            n_mixtures: 5,
            background_ratio: 0.9,
            var_threshold_gen: 9.0,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
            shadow_tau: 0.5,
        }
    }
}

/// Everything the frame-by-frame tracking core needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Resize factor applied to every decoded frame, in (0, 1] (default: 0.5).
    pub scale_factor: f64,
    /// Displacements at or below this many pixels are discarded (default: 2.0).
    pub min_movement_threshold: f32,
    pub features: FeatureParams,
    pub flow: FlowParams,
    pub background: BackgroundParams,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            scale_factor: 0.5,
            min_movement_threshold: 2.0,
            features: FeatureParams::default(),
            flow: FlowParams::default(),
            background: BackgroundParams::default(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> MotionError {
    MotionError::InvalidConfig(msg.into())
}

impl FeatureParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_corners == 0 {
            return Err(invalid("max_corners must be at least 1"));
        }
        if !(self.quality_level > 0.0 && self.quality_level <= 1.0) {
            return Err(invalid(format!(
                "quality_level must be in (0, 1], got {}",
                self.quality_level
            )));
        }
        if !(self.min_distance >= 0.0) {
            return Err(invalid("min_distance must be non-negative"));
        }
        if self.block_size < 1 {
            return Err(invalid("block_size must be at least 1"));
        }
        Ok(())
    }
}

impl FlowParams {
    pub fn validate(&self) -> Result<()> {
        if self.win_size < 3 || self.win_size % 2 == 0 {
            return Err(invalid(format!(
                "win_size must be odd and at least 3, got {}",
                self.win_size
            )));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        if !(self.epsilon >= 0.0) {
            return Err(invalid("epsilon must be non-negative"));
        }
        if !(self.min_eigen_threshold >= 0.0) {
            return Err(invalid("min_eigen_threshold must be non-negative"));
        }
        Ok(())
    }
}

impl BackgroundParams {
    pub fn validate(&self) -> Result<()> {
        if self.history == 0 {
            return Err(invalid("history must be at least 1"));
        }
        if !(self.var_threshold > 0.0) {
            return Err(invalid("var_threshold must be positive"));
        }
        if self.n_mixtures == 0 || self.n_mixtures > u8::MAX as usize {
            return Err(invalid("n_mixtures must be in 1..=255"));
        }
        if !(self.background_ratio > 0.0 && self.background_ratio <= 1.0) {
            return Err(invalid("background_ratio must be in (0, 1]"));
        }
        if !(self.var_min > 0.0 && self.var_min <= self.var_max) {
            return Err(invalid("variance bounds must satisfy 0 < var_min <= var_max"));
        }
        if !(self.shadow_tau >= 0.0 && self.shadow_tau <= 1.0) {
            return Err(invalid("shadow_tau must be in [0, 1]"));
        }
        Ok(())
    }
}

impl TrackingConfig {
    /// Check every field against its domain.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor > 0.0 && self.scale_factor <= 1.0) {
            return Err(invalid(format!(
                "scale_factor must be in (0, 1], got {}",
                self.scale_factor
            )));
        }
        if !(self.min_movement_threshold >= 0.0) {
            return Err(invalid(format!(
                "min_movement_threshold must be >= 0, got {}",
                self.min_movement_threshold
            )));
        }
        self.features.validate()?;
        self.flow.validate()?;
        self.background.validate()
    }
}

/// Configuration for a whole analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub tracking: TrackingConfig,
    /// Directory receiving CSV tables and chart data.
    pub output_dir: PathBuf,
    /// Write chart series next to the tables.
    pub save_charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            output_dir: PathBuf::from("movement_analysis_results"),
            save_charts: true,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracking.validate()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
