//! Headless window: presents frames nowhere, optionally saving them.

use super::{Canvas, RenderError, Rect, Window};
use std::path::PathBuf;

/// A window without a display.
///
/// Useful on machines with no terminal attached and for recording what the
/// device drew: with a snapshot directory every presented frame is written
/// as `frame-NNNNNN.png`.
#[derive(Debug)]
pub struct HeadlessWindow {
    width: u16,
    height: u16,
    frames: u64,
    snapshot_dir: Option<PathBuf>,
}

impl HeadlessWindow {
    /// Create a headless window, creating the snapshot directory if needed.
    pub fn new(width: u16, height: u16, snapshot_dir: Option<PathBuf>) -> Result<Self, RenderError> {
        if let Some(dir) = &snapshot_dir {
            std::fs::create_dir_all(dir)?;
        }
        tracing::info!(width, height, snapshots = ?snapshot_dir, "opened headless window");
        Ok(Self {
            width,
            height,
            frames: 0,
            snapshot_dir,
        })
    }

    /// Window size requested by the device.
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Frames presented so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Window for HeadlessWindow {
    fn present(&mut self, canvas: &Canvas, dirty: &[Rect]) -> Result<(), RenderError> {
        if dirty.is_empty() {
            return Ok(());
        }
        if let Some(dir) = &self.snapshot_dir {
            let path = dir.join(format!("frame-{:06}.png", self.frames));
            canvas.pixels().save(&path)?;
            tracing::trace!(path = %path.display(), "saved snapshot");
        }
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_snapshots_only_dirty_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut window = HeadlessWindow::new(4, 4, Some(dir.path().join("frames"))).unwrap();
        let canvas = Canvas::new(4, 4, Rgba([0, 0, 0, 255]));

        window.present(&canvas, &[canvas.bounds()]).unwrap();
        window.present(&canvas, &[]).unwrap();

        assert_eq!(window.frames(), 1);
        assert!(dir.path().join("frames/frame-000000.png").exists());
        assert!(!dir.path().join("frames/frame-000001.png").exists());
    }
}
