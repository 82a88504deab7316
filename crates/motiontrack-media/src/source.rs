//! The lazy, finite frame sequence feeding the tracker.

use crate::decoder::{FfmpegReader, RawFrameReader};
use crate::probe::MediaProbe;
use motiontrack_core::{scaled_dimensions, Frame, MotionError, Result};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Scaled `(color, gray)` frames, numbered from 1.
///
/// The sequence cannot be restarted. Once the underlying reader reports the
/// end of the stream (or fails), the reader is dropped, which releases the
/// decode handle, and the iterator only yields `None` from then on. Dropping
/// the source early releases the handle as well.
pub struct FrameSource<R: RawFrameReader> {
    reader: Option<R>,
    label: PathBuf,
    scale: f64,
    source_dims: (u32, u32),
    next_index: u64,
}

impl FrameSource<FfmpegReader> {
    /// Open a video file, scaling every frame by `scale`.
    pub fn open<P: AsRef<Path>>(path: P, scale: f64) -> Result<(Self, MediaProbe)> {
        let path = path.as_ref();
        check_scale(scale)?;
        let (reader, probe) = FfmpegReader::open(path)?;
        let source = Self::new(reader, path, scale)?;
        Ok((source, probe))
    }
}

impl<R: RawFrameReader> FrameSource<R> {
    /// Wrap a raw reader. `label` names the source in diagnostics.
    pub fn new(reader: R, label: impl Into<PathBuf>, scale: f64) -> Result<Self> {
        check_scale(scale)?;
        let source_dims = reader.dimensions();
        Ok(Self {
            reader: Some(reader),
            label: label.into(),
            scale,
            source_dims,
            next_index: 1,
        })
    }

    /// Dimensions of the frames this source yields.
    pub fn output_dimensions(&self) -> (u32, u32) {
        scaled_dimensions(self.source_dims.0, self.source_dims.1, self.scale)
    }

    /// Number of frames yielded so far.
    pub fn frames_read(&self) -> u64 {
        self.next_index - 1
    }

    /// True once the decode handle has been released.
    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none()
    }
}

fn check_scale(scale: f64) -> Result<()> {
    if scale > 0.0 && scale <= 1.0 {
        Ok(())
    } else {
        Err(MotionError::InvalidConfig(format!(
            "scale_factor must be in (0, 1], got {scale}"
        )))
    }
}

impl<R: RawFrameReader> Iterator for FrameSource<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        match reader.read_frame() {
            Ok(Some(raw)) => {
                let frame = Frame::from_rgb(self.next_index, &raw, self.scale);
                self.next_index += 1;
                Some(Ok(frame))
            }
            Ok(None) => {
                self.reader = None;
                None
            }
            Err(e) => {
                self.reader = None;
                if self.next_index == 1 {
                    // Nothing was ever decoded: the source is unreadable.
                    Some(Err(MotionError::open(&self.label, e.to_string())))
                } else {
                    warn!(
                        source = %self.label.display(),
                        frames = self.frames_read(),
                        error = %e,
                        "Decoder failed mid-stream, ending sequence"
                    );
                    None
                }
            }
        }
    }
}

impl<R: RawFrameReader> FusedIterator for FrameSource<R> {}
