//! Cell: one terminal character showing two stacked pixels.
//!
//! Every cell prints `▀` (upper half block) with the foreground set to the
//! top pixel and the background set to the bottom pixel, doubling the
//! vertical resolution of the terminal.

use image::Rgba;

/// An opaque canvas pixel as the terminal sees it.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Pixel from its three channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The window's clear colour.
    pub const BLACK: Self = Self::new(0, 0, 0);
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<Rgba<u8>> for Rgb {
    /// Drops alpha; canvas pixels are always opaque.
    #[inline]
    fn from(Rgba([r, g, b, _]): Rgba<u8>) -> Self {
        Self::new(r, g, b)
    }
}

/// A half-block cell.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Cell {
    /// Upper pixel, drawn as the glyph foreground.
    pub top: Rgb,
    /// Lower pixel, drawn as the cell background.
    pub bottom: Rgb,
}

impl Cell {
    /// The glyph every cell prints.
    pub const GLYPH: &'static str = "\u{2580}";

    /// A black cell.
    pub const EMPTY: Self = Self::new(Rgb::BLACK, Rgb::BLACK);

    /// Create a cell from its two pixels.
    #[inline]
    pub const fn new(top: Rgb, bottom: Rgb) -> Self {
        Self { top, bottom }
    }
}

/// Row-major half-block cells covering the canvas.
#[derive(Clone, Debug)]
pub struct CellGrid {
    cells: Vec<Cell>,
    cols: u16,
    rows: u16,
}

impl CellGrid {
    /// All-black grid of `cols` x `rows` cells.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cells: vec![Cell::EMPTY; usize::from(cols) * usize::from(rows)],
            cols,
            rows,
        }
    }

    /// Columns.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.cols
    }

    /// Rows; each covers two canvas rows.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.rows
    }

    /// Offset of the cell at column `x`, row `y`.
    #[inline]
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.cols && y < self.rows).then(|| usize::from(y) * usize::from(self.cols) + usize::from(x))
    }

    /// Cell at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.cells.get(self.index_of(x, y)?)
    }

    /// Overwrite one cell; `false` when outside the grid.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let Some(slot) = self.index_of(x, y).and_then(|i| self.cells.get_mut(i)) else {
            return false;
        };
        *slot = cell;
        true
    }

    /// Make this grid match `other`, which must be the same size.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!((self.cols, self.rows), (other.cols, other.rows));
        self.cells.clone_from_slice(&other.cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_pixel() {
        assert_eq!(Rgb::from(Rgba([1, 2, 3, 255])), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_grid_bounds() {
        let mut grid = CellGrid::new(4, 3);
        let cell = Cell::new(Rgb::new(255, 0, 0), Rgb::BLACK);
        assert!(grid.set(3, 2, cell));
        assert!(!grid.set(4, 2, cell));
        assert_eq!(grid.get(3, 2), Some(&cell));
        assert_eq!(grid.index_of(1, 1), Some(5));
    }
}
