//! Render module: the drawing capability the core depends on.
//!
//! The host never touches pixels directly. Everything that decodes, scales,
//! rotates or presents an image goes through the [`Renderer`] and
//! [`Window`] traits, so the link and render actors can be tested against a
//! stub and run against the bundled [`SoftwareRenderer`].
//!
//! This module contains:
//! - [`Surface`]: shared immutable RGBA pixels
//! - [`Mask`]: per-pixel opacity bitmap for collisions
//! - [`Canvas`]: the back buffer drawables are composited into
//! - [`Rect`]: signed screen-space rectangles
//! - [`SoftwareRenderer`]: `image`-backed implementation with headless and
//!   terminal windows

mod canvas;
mod headless;
mod mask;
mod rect;
mod software;
mod surface;

pub use canvas::Canvas;
pub use headless::HeadlessWindow;
pub use mask::Mask;
pub use rect::Rect;
pub use software::{Backend, SoftwareRenderer, SoftwareRendererConfig};
pub use surface::Surface;

use image::Rgba;
use thiserror::Error;

/// Errors raised by renderers and windows.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The window could not be opened or drawn to.
    #[error("window error: {0}")]
    Window(String),

    /// An image name resolved outside the asset root.
    #[error("image name escapes the asset root: {0}")]
    OutsideAssets(String),

    /// A surface or window would exceed the pixel budget.
    #[error("{width}x{height} exceeds the budget of {limit} pixels")]
    TooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Pixel budget in force.
        limit: u64,
    },
}

/// Default pixel budget for one surface or window: 4096 x 4096.
pub const MAX_PIXELS: u64 = 1 << 24;

/// Fail with [`RenderError::TooLarge`] unless `width` x `height` fits in
/// `limit` pixels.
pub fn check_extent(width: u32, height: u32, limit: u64) -> Result<(), RenderError> {
    if u64::from(width) * u64::from(height) > limit {
        return Err(RenderError::TooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

/// Image operations shared by both actors.
///
/// The link actor uses it to load sprites and compute collision masks, the
/// render actor to transform surfaces and open the window, so
/// implementations must be callable from either thread.
pub trait Renderer: Send + Sync {
    /// Load an image by name.
    fn load_image(&self, name: &str) -> Result<Surface, RenderError>;

    /// Scale `source` to `size`, then rotate it `angle` degrees
    /// counter-clockwise about its centre.
    ///
    /// Fails without allocating when the result would exceed
    /// [`max_pixels`](Self::max_pixels).
    fn transform(&self, source: &Surface, size: (u16, u16), angle: u16) -> Result<Surface, RenderError>;

    /// Opacity mask of a transformed surface.
    fn compute_mask(&self, surface: &Surface) -> Mask;

    /// Whether two masks placed with their top-left corners at `a_at` and
    /// `b_at` share an opaque pixel.
    fn masks_overlap(&self, a: &Mask, a_at: (i32, i32), b: &Mask, b_at: (i32, i32)) -> bool {
        a.overlaps((b_at.0 - a_at.0, b_at.1 - a_at.1), b)
    }

    /// Largest surface or window, in pixels, this renderer will allocate.
    fn max_pixels(&self) -> u64 {
        MAX_PIXELS
    }

    /// Colour the canvas is cleared to.
    fn background(&self) -> Rgba<u8> {
        Rgba([0, 0, 0, 255])
    }

    /// Open the display window.
    fn open_window(&self, width: u16, height: u16) -> Result<Box<dyn Window>, RenderError>;
}

/// A display surface owned by the render actor.
pub trait Window: Send {
    /// Show the canvas; only pixels inside `dirty` changed since the last
    /// call. The first call after opening always receives the full bounds.
    fn present(&mut self, canvas: &Canvas, dirty: &[Rect]) -> Result<(), RenderError>;

    /// Whether the operator asked to close the window.
    fn poll_quit(&mut self) -> bool {
        false
    }
}
