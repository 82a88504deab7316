//! Raw frame decoding through an `ffmpeg` subprocess.
//!
//! FFmpeg is spawned with rawvideo RGB24 output on stdout, so the crate
//! needs no FFmpeg development headers. The child process is the decode
//! handle: it is killed and reaped when the reader is dropped.

use crate::probe::MediaProbe;
use image::RgbImage;
use motiontrack_core::{MotionError, Result};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info};

/// How much of ffmpeg's diagnostic output is kept for error reports.
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Source of full-resolution RGB frames.
pub trait RawFrameReader {
    /// Dimensions of every frame this reader yields.
    fn dimensions(&self) -> (u32, u32);

    /// Read the next frame, or `Ok(None)` once the stream has ended.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Video decoder backed by an `ffmpeg` child process.
pub struct FfmpegReader {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    /// Drains stderr while frames stream, yielding its tail.
    stderr_drain: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frames_read: u64,
    finished: bool,
}

impl FfmpegReader {
    /// Probe and open a video file for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, MediaProbe)> {
        let probe = MediaProbe::probe(path.as_ref())?;
        let reader = Self::spawn(path.as_ref(), &probe)?;
        Ok((reader, probe))
    }

    /// Start decoding a file whose dimensions are already known.
    pub fn spawn(path: &Path, probe: &MediaProbe) -> Result<Self> {
        let ffmpeg = crate::find_tool("ffmpeg")
            .ok_or_else(|| MotionError::open(path, "ffmpeg not found on PATH"))?;
        Self::spawn_with(&ffmpeg, path, probe.width, probe.height)
    }

    /// Start decoding with an explicit ffmpeg executable.
    pub fn spawn_with(ffmpeg: &Path, path: &Path, width: u32, height: u32) -> Result<Self> {
        info!("Opening video file: {}", path.display());

        // Frames must keep the probed dimensions, so rotation metadata is ignored.
        let mut child = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MotionError::open(path, format!("failed to spawn ffmpeg: {e}")))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MotionError::open(path, "failed to capture ffmpeg stdout"));
            }
        };
        let stderr_drain = child.stderr.take().map(spawn_stderr_drain);

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            stderr_drain,
            width,
            height,
            frames_read: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Fill `buf` completely. Returns the byte count actually read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(MotionError::Decode(format!("read from ffmpeg failed: {e}"))),
            }
        }
        Ok(filled)
    }

    /// Reap the child and turn a non-zero exit into a decode error.
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| MotionError::Decode(format!("failed to wait for ffmpeg: {e}")))?;
        if status.success() {
            debug!(frames = self.frames_read, "ffmpeg finished");
            return Ok(());
        }
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Err(MotionError::Decode(format!(
            "ffmpeg exited with {status}: {}",
            stderr.trim()
        )))
    }
}

/// Read stderr to the end on a helper thread so ffmpeg never blocks on a
/// full pipe. Only the last [`STDERR_TAIL_BYTES`] are kept.
fn spawn_stderr_drain(mut pipe: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut tail: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    tail.extend_from_slice(&chunk[..n]);
                    if tail.len() > STDERR_TAIL_BYTES {
                        let excess = tail.len() - STDERR_TAIL_BYTES;
                        tail.drain(..excess);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        String::from_utf8_lossy(&tail).into_owned()
    })
}

impl RawFrameReader for FfmpegReader {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_size()];
        let filled = self.fill(&mut buf)?;

        if filled < buf.len() {
            if filled > 0 {
                debug!(bytes = filled, "Discarding truncated trailing frame");
            }
            self.finish()?;
            return Ok(None);
        }

        self.frames_read += 1;
        RgbImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| MotionError::Decode("frame buffer size mismatch".into()))
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
            debug!(path = %self.path.display(), "Released decoder before end of stream");
        }
    }
}
