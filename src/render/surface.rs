//! Surface: shared immutable RGBA pixels.

use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// An immutable image that can be cheaply cloned between actors.
#[derive(Clone)]
pub struct Surface {
    image: Arc<RgbaImage>,
}

impl Surface {
    /// Wrap decoded pixels.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// A zero-sized surface.
    pub fn empty() -> Self {
        Self::new(RgbaImage::new(0, 0))
    }

    /// A surface of one colour.
    pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, color))
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the surface has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Underlying pixels.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Surface({}x{})", self.width(), self.height())
    }
}
