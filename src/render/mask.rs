//! Mask: packed per-pixel opacity bitmap for pixel-accurate collisions.

use super::surface::Surface;

/// One bit per pixel, rows packed into `u64` words.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// An all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// Mask of every pixel whose alpha exceeds `threshold`.
    pub fn from_surface(surface: &Surface, threshold: u8) -> Self {
        let image = surface.image();
        let mut mask = Self::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel[3] > threshold {
                mask.set(x, y, true);
            }
        }
        mask
    }

    /// Mask width.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at (x, y) is opaque. Out of bounds is clear.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = self.bits[y as usize * self.words_per_row + (x as usize >> 6)];
        word & (1 << (x & 63)) != 0
    }

    /// Set or clear the pixel at (x, y). Out of bounds is ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, opaque: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.words_per_row + (x as usize >> 6);
        let bit = 1u64 << (x & 63);
        if opaque {
            self.bits[index] |= bit;
        } else {
            self.bits[index] &= !bit;
        }
    }

    /// Number of opaque pixels.
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// Whether any opaque pixel of `other`, placed at `offset` relative to
    /// this mask's origin, lands on an opaque pixel of this mask.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn overlaps(&self, offset: (i32, i32), other: &Self) -> bool {
        let (dx, dy) = offset;
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (self.width as i32).min(dx + other.width as i32);
        let y1 = (self.height as i32).min(dy + other.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x as u32, y as u32) && other.get((x - dx) as u32, (y - dy) as u32) {
                    return true;
                }
            }
        }
        false
    }
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mask({}x{}, {} set)", self.width, self.height, self.count())
    }
}
