//! Media file probing to get metadata without a full decode.

use motiontrack_core::{FrameRate, MotionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Information about the primary video stream of a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Container format
    pub format: String,
    /// Video codec
    pub codec: String,
    /// Decoded frame width in pixels
    pub width: u32,
    /// Decoded frame height in pixels
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Frame count from the container, or estimated from the duration
    pub frame_count: Option<u64>,
    /// Duration in seconds
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

impl MediaProbe {
    /// Probe a media file with `ffprobe`.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MotionError::open(path, "file not found"));
        }

        let ffprobe = crate::find_tool("ffprobe")
            .ok_or_else(|| MotionError::open(path, "ffprobe not found on PATH"))?;

        let output = Command::new(ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| MotionError::open(path, format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MotionError::open(path, stderr.trim().to_string()));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        Self::from_ffprobe_json(path, &json)
    }

    /// Build a probe from `ffprobe -print_format json` output.
    pub fn from_ffprobe_json(path: &Path, json: &str) -> Result<Self> {
        let parsed: ProbeOutput = serde_json::from_str(json)
            .map_err(|e| MotionError::open(path, format!("unreadable probe output: {e}")))?;

        let stream = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref().unwrap_or("video") == "video" && s.width.is_some())
            .ok_or_else(|| MotionError::open(path, "no video stream"))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(MotionError::open(path, "video stream has no dimensions")),
        };

        let frame_rate = [&stream.avg_frame_rate, &stream.r_frame_rate]
            .into_iter()
            .flatten()
            .filter_map(|r| r.parse::<FrameRate>().ok())
            .find(|r| r.is_valid())
            .unwrap_or_default();

        let duration = stream
            .duration
            .as_deref()
            .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let frame_count = stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .or_else(|| (duration > 0.0).then(|| frame_rate.frames_in(duration)));

        let probe = Self {
            path: path.to_string_lossy().to_string(),
            format: parsed
                .format
                .and_then(|f| f.format_name)
                .unwrap_or_else(|| "unknown".to_string()),
            codec: stream
                .codec_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            width,
            height,
            frame_rate,
            frame_count,
            duration,
        };
        debug!(?probe, "Probed media");
        Ok(probe)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
