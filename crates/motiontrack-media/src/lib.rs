//! MotionTrack Media - FFmpeg-backed frame input
//!
//! This crate handles:
//! - Media file probing through `ffprobe`
//! - Raw RGB frame decoding through an `ffmpeg` subprocess
//! - The scaled, indexed frame sequence consumed by the tracker

pub mod decoder;
pub mod probe;
pub mod source;

pub use decoder::{FfmpegReader, RawFrameReader};
pub use probe::MediaProbe;
pub use source::FrameSource;

/// Locate an FFmpeg tool on `PATH`.
pub(crate) fn find_tool(name: &str) -> Option<std::path::PathBuf> {
    which::which(name).ok()
}
