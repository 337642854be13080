//! Canvas: the back buffer sprites are composited into.
//!
//! Pixels are stored row-major in a single `RgbaImage`. All writes are
//! clipped to the canvas, so callers can pass rectangles that hang off the
//! window edge.

use super::rect::Rect;
use super::surface::Surface;
use image::{Rgba, RgbaImage};

/// The composited frame presented to a window.
#[derive(Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    background: Rgba<u8>,
}

impl Canvas {
    /// Create a canvas filled with `background`.
    ///
    /// # Panics
    /// Panics if width or height is 0.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        assert!(width > 0 && height > 0, "Canvas dimensions must be non-zero");
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
        }
    }

    /// Canvas width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Canvas height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Rectangle covering the whole canvas.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    /// Background colour used by [`Canvas::clear_rect`].
    #[inline]
    pub const fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Read a pixel. Returns `None` outside the canvas.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.pixels.get_pixel(x, y))
        } else {
            None
        }
    }

    /// The composited pixels.
    #[inline]
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Fill a rectangle with one colour.
    #[allow(clippy::cast_sign_loss)]
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let Some(area) = rect.intersection(&self.bounds()) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.pixels.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Restore the background inside `rect`.
    pub fn clear_rect(&mut self, rect: Rect) {
        self.fill_rect(rect, self.background);
    }

    /// Restore the background everywhere.
    pub fn clear(&mut self) {
        self.clear_rect(self.bounds());
    }

    /// Alpha-blend `surface` with its top-left corner at `origin`, touching
    /// only pixels inside `clip`.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn blit(&mut self, surface: &Surface, origin: (i32, i32), clip: Rect) {
        let placed = Rect::new(origin.0, origin.1, surface.width(), surface.height());
        let Some(area) = placed
            .intersection(&clip)
            .and_then(|r| r.intersection(&self.bounds()))
        else {
            return;
        };

        let source = surface.image();
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let src = *source.get_pixel((x - origin.0) as u32, (y - origin.1) as u32);
                if src[3] == 0 {
                    continue;
                }
                let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
                *dst = blend(src, *dst);
            }
        }
    }
}

/// Source-over blend onto an opaque destination.
#[inline]
fn blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let alpha = u32::from(src[3]);
    if alpha == 255 {
        return Rgba([src[0], src[1], src[2], 255]);
    }
    let inv = 255 - alpha;
    #[allow(clippy::cast_possible_truncation)]
    let mix = |s: u8, d: u8| ((u32::from(s) * alpha + u32::from(d) * inv + 127) / 255) as u8;
    Rgba([mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), 255])
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canvas({}x{})", self.width(), self.height())
    }
}
