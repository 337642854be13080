//! `OutputBuffer`: one frame of half-block ANSI output, written at once.

use super::cell::{Cell, Rgb};
use std::io::Write;

/// Frame-sized byte buffer of escape sequences and glyphs.
///
/// Frames are wrapped in synchronized-update markers so terminals that
/// support them swap the whole frame at once.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Forget the previous frame.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Bytes accumulated so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes accumulated.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Start a frame: synchronized update on, cursor hidden.
    pub fn begin_frame(&mut self) {
        self.data.extend_from_slice(b"\x1b[?2026h\x1b[?25l");
    }

    /// End a frame started with [`begin_frame`](Self::begin_frame).
    pub fn end_frame(&mut self) {
        self.data.extend_from_slice(b"\x1b[?2026l");
    }

    /// Reset attributes and blank the screen.
    pub fn wipe(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m\x1b[2J");
    }

    /// Move to cell (x, y), 0-indexed.
    pub fn move_to(&mut self, x: u16, y: u16) {
        if x == 0 && y == 0 {
            self.data.extend_from_slice(b"\x1b[H");
        } else {
            let _ = write!(self.data, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1);
        }
    }

    /// Set the top (foreground) and/or bottom (background) colour in one
    /// SGR sequence. Returns the number of colours changed.
    pub fn colors(&mut self, top: Option<Rgb>, bottom: Option<Rgb>) -> usize {
        match (top, bottom) {
            (None, None) => 0,
            (Some(t), None) => {
                let _ = write!(self.data, "\x1b[38;2;{};{};{}m", t.r, t.g, t.b);
                1
            }
            (None, Some(b)) => {
                let _ = write!(self.data, "\x1b[48;2;{};{};{}m", b.r, b.g, b.b);
                1
            }
            (Some(t), Some(b)) => {
                let _ = write!(
                    self.data,
                    "\x1b[38;2;{};{};{};48;2;{};{};{}m",
                    t.r, t.g, t.b, b.r, b.g, b.b
                );
                2
            }
        }
    }

    /// Print the half-block glyph.
    #[inline]
    pub fn glyph(&mut self) {
        self.data.extend_from_slice(Cell::GLYPH.as_bytes());
    }

    /// Write everything to `writer` and flush.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(1 << 16)
    }
}
