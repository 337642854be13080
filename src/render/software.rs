//! Software renderer backed by the `image` crate.

use super::headless::HeadlessWindow;
use super::{check_extent, Mask, RenderError, Renderer, Surface, Window, MAX_PIXELS};
use crate::terminal::TerminalWindow;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Where frames are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// True-colour half-block cells in the controlling terminal.
    #[default]
    Terminal,
    /// No display; frames are counted and optionally saved as PNG.
    Headless,
}

/// Configuration for [`SoftwareRenderer`].
#[derive(Debug, Clone)]
pub struct SoftwareRendererConfig {
    /// Directory image names are resolved against.
    pub asset_root: PathBuf,
    /// Alpha values above this count as solid for collisions.
    pub mask_threshold: u8,
    /// Canvas clear colour.
    pub background: Rgba<u8>,
    /// Window backend.
    pub backend: Backend,
    /// Headless only: write every presented frame here.
    pub snapshot_dir: Option<PathBuf>,
    /// Largest surface or window, in pixels.
    pub max_pixels: u64,
}

impl Default for SoftwareRendererConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            mask_threshold: 127,
            background: Rgba([0, 0, 0, 255]),
            backend: Backend::default(),
            snapshot_dir: None,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// CPU renderer: decodes files, smooth-scales and rotates them in memory.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRenderer {
    config: SoftwareRendererConfig,
}

impl SoftwareRenderer {
    /// Create a renderer with the given configuration.
    pub const fn new(config: SoftwareRendererConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &SoftwareRendererConfig {
        &self.config
    }

    /// Resolve an image name the device sent to a file under the asset
    /// root. Absolute names and `..` escapes are refused.
    fn resolve(&self, name: &str) -> Result<PathBuf, RenderError> {
        let root = self.config.asset_root.canonicalize()?;
        let path = root.join(Path::new(name)).canonicalize()?;
        if !path.starts_with(&root) {
            return Err(RenderError::OutsideAssets(name.to_string()));
        }
        Ok(path)
    }
}

impl Renderer for SoftwareRenderer {
    fn load_image(&self, name: &str) -> Result<Surface, RenderError> {
        let path = self.resolve(name)?;
        let image = image::open(&path)?.to_rgba8();
        tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
        Ok(Surface::new(image))
    }

    fn transform(&self, source: &Surface, size: (u16, u16), angle: u16) -> Result<Surface, RenderError> {
        let (width, height) = (u32::from(size.0), u32::from(size.1));
        if width == 0 || height == 0 || source.is_empty() {
            return Ok(Surface::empty());
        }
        check_extent(width, height, self.config.max_pixels)?;
        let (out_w, out_h) = rotated_extent(width, height, angle);
        check_extent(out_w, out_h, self.config.max_pixels)?;

        let scaled = if source.width() == width && source.height() == height {
            source.image().clone()
        } else {
            imageops::resize(source.image(), width, height, FilterType::Triangle)
        };

        Ok(Surface::new(rotate_ccw(&scaled, angle)))
    }

    fn max_pixels(&self) -> u64 {
        self.config.max_pixels
    }

    fn compute_mask(&self, surface: &Surface) -> Mask {
        Mask::from_surface(surface, self.config.mask_threshold)
    }

    fn background(&self) -> Rgba<u8> {
        self.config.background
    }

    fn open_window(&self, width: u16, height: u16) -> Result<Box<dyn Window>, RenderError> {
        check_extent(u32::from(width), u32::from(height), self.config.max_pixels)?;
        match self.config.backend {
            Backend::Headless => Ok(Box::new(HeadlessWindow::new(
                width,
                height,
                self.config.snapshot_dir.clone(),
            )?)),
            Backend::Terminal => Ok(Box::new(TerminalWindow::open(width, height)?)),
        }
    }
}

/// Bounds of a `width` x `height` image after a counter-clockwise turn of
/// `angle` degrees.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rotated_extent(width: u32, height: u32, angle: u16) -> (u32, u32) {
    match angle % 360 {
        0 | 180 => (width, height),
        90 | 270 => (height, width),
        degrees => {
            let (sin, cos) = f64::from(degrees).to_radians().sin_cos();
            let (w, h) = (f64::from(width), f64::from(height));
            (
                (w * cos.abs() + h * sin.abs()).ceil().max(1.0) as u32,
                (w * sin.abs() + h * cos.abs()).ceil().max(1.0) as u32,
            )
        }
    }
}

/// Rotate counter-clockwise by whole degrees, growing the canvas to fit.
///
/// Quarter turns are exact; other angles sample the nearest source pixel.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn rotate_ccw(image: &RgbaImage, angle: u16) -> RgbaImage {
    match angle % 360 {
        0 => return image.clone(),
        90 => return imageops::rotate270(image),
        180 => return imageops::rotate180(image),
        270 => return imageops::rotate90(image),
        _ => {}
    }

    let theta = f64::from(angle % 360).to_radians();
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    let (out_w, out_h) = rotated_extent(image.width(), image.height(), angle);

    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ox, oy) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);

    let mut out = RgbaImage::new(out_w, out_h);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        // Inverse mapping: rotate the destination centre back by -theta.
        let dx = f64::from(x) + 0.5 - ox;
        let dy = f64::from(y) + 0.5 - oy;
        let sx = dx.mul_add(cos, -(dy * sin)) + cx;
        let sy = dx.mul_add(sin, dy * cos) + cy;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *pixel = *image.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}
