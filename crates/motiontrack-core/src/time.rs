//! Frame rate representation for probed media.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Frames per second, or 0 for a degenerate rate.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Whether the rate can be used for time conversions.
    pub fn is_valid(self) -> bool {
        self.numerator > 0 && self.denominator > 0
    }

    /// Frame count covering `seconds` of media, rounded to the nearest frame.
    pub fn frames_in(self, seconds: f64) -> u64 {
        (seconds * self.to_fps_f64()).round().max(0.0) as u64
    }

    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl FromStr for FrameRate {
    type Err = String;

    /// Parses `"30000/1001"` or a plain integer such as `"25"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n, d),
            None => (s, "1"),
        };
        let numerator = num
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("bad frame rate numerator {num:?}: {e}"))?;
        let denominator = den
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("bad frame rate denominator {den:?}: {e}"))?;
        Ok(Self::new(numerator, denominator))
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational() {
        let rate: FrameRate = "30000/1001".parse().unwrap();
        assert_eq!(rate, FrameRate::FPS_29_97);
        assert!((rate.to_fps_f64() - 29.97).abs() < 0.001);
        assert_eq!(rate.to_string(), "29.970 fps");
    }

    #[test]
    fn test_parse_integer() {
        let rate: FrameRate = "25".parse().unwrap();
        assert_eq!(rate, FrameRate::FPS_25);
        assert_eq!(rate.to_string(), "25 fps");
    }

    #[test]
    fn test_degenerate_rate() {
        let rate: FrameRate = "0/0".parse().unwrap();
        assert!(!rate.is_valid());
        assert_eq!(rate.to_fps_f64(), 0.0);
        assert!("abc".parse::<FrameRate>().is_err());
    }

    #[test]
    fn test_frames_in() {
        assert_eq!(FrameRate::FPS_24.frames_in(10.0), 240);
    }
}
