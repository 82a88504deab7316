//! Binary foreground masks and the morphological clean-up applied to them.

/// Binary mask marking pixels that belong to moving content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionMask {
    pub width: u32,
    pub height: u32,
    data: Vec<bool>,
}

impl MotionMask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; (width * height) as usize],
        }
    }

    /// An all-foreground mask.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![true; (width * height) as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.data[(y * width + x) as usize] = f(x, y);
            }
        }
        mask
    }

    /// Out-of-range reads return `false`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, val: bool) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Minimum filter over a `size` x `size` square. Pixels outside the
    /// image do not take part.
    pub fn erode(&self, size: u32) -> Self {
        self.rank_filter(size, true)
    }

    /// Maximum filter over a `size` x `size` square.
    pub fn dilate(&self, size: u32) -> Self {
        self.rank_filter(size, false)
    }

    /// Erode then dilate: removes isolated specks smaller than the square.
    pub fn open(&self, size: u32) -> Self {
        self.erode(size).dilate(size)
    }

    /// Dilate then erode: fills holes and gaps smaller than the square.
    pub fn close(&self, size: u32) -> Self {
        self.dilate(size).erode(size)
    }

    /// Separable square min/max filter.
    fn rank_filter(&self, size: u32, erode: bool) -> Self {
        if size <= 1 {
            return self.clone();
        }
        let lo = (size / 2) as i64;
        let hi = (size - 1) as i64 - lo;
        let (w, h) = (self.width as i64, self.height as i64);

        // Erosion starts from "all set" and ANDs, dilation from "none set" and ORs.
        let combine = |acc: bool, v: bool| if erode { acc && v } else { acc || v };

        let mut horizontal = Self::new(self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                let x0 = (x - lo).max(0);
                let x1 = (x + hi).min(w - 1);
                let mut acc = erode;
                for sx in x0..=x1 {
                    acc = combine(acc, self.data[(y * w + sx) as usize]);
                }
                horizontal.data[(y * w + x) as usize] = acc;
            }
        }

        let mut out = Self::new(self.width, self.height);
        for y in 0..h {
            let y0 = (y - lo).max(0);
            let y1 = (y + hi).min(h - 1);
            for x in 0..w {
                let mut acc = erode;
                for sy in y0..=y1 {
                    acc = combine(acc, horizontal.data[(sy * w + x) as usize]);
                }
                out.data[(y * w + x) as usize] = acc;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> MotionMask {
        MotionMask::from_fn(w, h, |x, y| {
            x >= x0 && x < x0 + side && y >= y0 && y < y0 + side
        })
    }

    #[test]
    fn test_open_removes_speck() {
        let mut mask = square(20, 20, 5, 5, 6);
        mask.set(15, 15, true);
        let opened = mask.open(3);
        assert!(!opened.get(15, 15));
        assert_eq!(opened.count(), 36);
    }

    #[test]
    fn test_close_fills_gap() {
        let mut mask = square(20, 20, 4, 4, 10);
        mask.set(8, 8, false);
        mask.set(9, 8, false);
        let closed = mask.close(5);
        assert!(closed.get(8, 8));
        assert!(closed.get(9, 8));
        assert_eq!(closed.count(), 100);
    }

    #[test]
    fn test_border_pixels_survive_erosion() {
        let mask = MotionMask::full(6, 6);
        assert_eq!(mask.erode(3).count(), 36);
    }

    #[test]
    fn test_open_then_close_differs_from_close_then_open() {
        // A lattice of isolated pixels: opening first wipes it out, closing
        // first fuses it into a solid block that opening then keeps.
        let mask = MotionMask::from_fn(20, 20, |x, y| {
            (4..=12).contains(&x) && (4..=12).contains(&y) && x % 2 == 0 && y % 2 == 0
        });
        let open_close = mask.open(3).close(5);
        let close_open = mask.close(5).open(3);
        assert!(open_close.is_empty());
        assert!(close_open.get(7, 7));
        assert_eq!(close_open.count(), 81);
        assert_ne!(open_close, close_open);
    }

    #[test]
    fn test_empty_mask() {
        let mask = MotionMask::new(4, 4);
        assert!(mask.is_empty());
        assert!(mask.open(3).close(5).is_empty());
    }
}
