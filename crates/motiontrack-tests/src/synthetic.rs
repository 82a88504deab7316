//! In-memory synthetic videos.

use image::{Rgb, RgbImage};
use motiontrack_core::Result;
use motiontrack_media::{FrameSource, RawFrameReader};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 160;
const SQUARE: u32 = 24;
const BACKGROUND: Rgb<u8> = Rgb([35, 45, 40]);
const OBJECT: Rgb<u8> = Rgb([235, 225, 200]);

/// Decoder stand-in that serves pre-rendered frames.
pub struct SyntheticReader {
    frames: std::vec::IntoIter<RgbImage>,
}

impl SyntheticReader {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl RawFrameReader for SyntheticReader {
    fn dimensions(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.next())
    }
}

fn render(square_x: Option<u32>) -> RgbImage {
    RgbImage::from_fn(WIDTH, HEIGHT, |x, y| match square_x {
        Some(x0) if (x0..x0 + SQUARE).contains(&x) && (68..68 + SQUARE).contains(&y) => OBJECT,
        _ => BACKGROUND,
    })
}

/// A bright square crossing the frame left to right, `step` px per frame.
pub fn moving_square(count: u32, step: u32) -> Vec<RgbImage> {
    (0..count).map(|i| render(Some(20 + i * step))).collect()
}

/// An empty, unchanging scene.
pub fn static_scene(count: u32) -> Vec<RgbImage> {
    (0..count).map(|_| render(None)).collect()
}

pub fn source(frames: Vec<RgbImage>, scale: f64) -> FrameSource<SyntheticReader> {
    FrameSource::new(SyntheticReader::new(frames), "synthetic", scale)
        .unwrap_or_else(|e| panic!("synthetic source: {e}"))
}
