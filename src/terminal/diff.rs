//! Diffing Engine: Generate minimal ANSI sequences from cell grid changes.
//!
//! 1. Compare the displayed and next grids inside the dirty regions
//! 2. Skip cursor moves when the next changed cell is adjacent
//! 3. Track colour state to avoid redundant SGR sequences
//!
//! All output is accumulated in one [`OutputBuffer`] and flushed with one
//! syscall.

use super::cell::{Cell, CellGrid, Rgb};
use super::output::OutputBuffer;
use crate::render::Rect;

/// Tracks the terminal's cursor and colour state between cells.
#[derive(Debug, Clone)]
pub struct DiffState {
    cursor_x: u16,
    cursor_y: u16,
    fg: Option<Rgb>,
    bg: Option<Rgb>,
}

impl Default for DiffState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffState {
    /// Create a new diff state with unknown terminal state.
    pub const fn new() -> Self {
        Self {
            cursor_x: u16::MAX,
            cursor_y: u16::MAX,
            fg: None,
            bg: None,
        }
    }

    /// Reset the state (e.g., after a full screen clear).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Result of a diff operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Number of cells that were different.
    pub cells_changed: usize,
    /// Number of cursor move sequences emitted.
    pub cursor_moves: usize,
    /// Number of color change sequences emitted.
    pub color_changes: usize,
}

/// Emit the changes between `current` and `next` within `regions` (cell
/// coordinates; empty = whole grid).
pub fn render_diff(
    current: &CellGrid,
    next: &CellGrid,
    regions: &[Rect],
    output: &mut OutputBuffer,
    state: &mut DiffState,
) -> DiffResult {
    debug_assert_eq!(current.width(), next.width());
    debug_assert_eq!(current.height(), next.height());

    let mut result = DiffResult::default();
    let full = Rect::from_size(u32::from(next.width()), u32::from(next.height()));
    let regions: &[Rect] = if regions.is_empty() {
        std::slice::from_ref(&full)
    } else {
        regions
    };

    for region in regions {
        if let Some(region) = region.intersection(&full) {
            diff_region(current, next, region, output, state, &mut result);
        }
    }
    result
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn diff_region(
    current: &CellGrid,
    next: &CellGrid,
    region: Rect,
    output: &mut OutputBuffer,
    state: &mut DiffState,
    result: &mut DiffResult,
) {
    for y in region.y as u16..region.bottom() as u16 {
        for x in region.x as u16..region.right() as u16 {
            let (Some(before), Some(after)) = (current.get(x, y), next.get(x, y)) else {
                continue;
            };
            if before == after {
                continue;
            }
            result.cells_changed += 1;

            if state.cursor_y != y || state.cursor_x != x {
                output.move_to(x, y);
                result.cursor_moves += 1;
            }
            emit_cell(output, *after, state, result);
            state.cursor_x = x.saturating_add(1);
            state.cursor_y = y;
        }
    }
}

fn emit_cell(output: &mut OutputBuffer, cell: Cell, state: &mut DiffState, result: &mut DiffResult) {
    let top = (state.fg != Some(cell.top)).then_some(cell.top);
    let bottom = (state.bg != Some(cell.bottom)).then_some(cell.bottom);
    result.color_changes += output.colors(top, bottom);
    state.fg = Some(cell.top);
    state.bg = Some(cell.bottom);
    output.glyph();
}

/// Generate a full redraw sequence (no diffing).
///
/// Used for the first frame, when the terminal contents are unknown.
pub fn render_full(grid: &CellGrid, output: &mut OutputBuffer, state: &mut DiffState) {
    output.wipe();
    state.reset();

    let mut ignored = DiffResult::default();
    for y in 0..grid.height() {
        output.move_to(0, y);
        for x in 0..grid.width() {
            if let Some(cell) = grid.get(x, y) {
                emit_cell(output, *cell, state, &mut ignored);
            }
        }
        state.cursor_x = grid.width();
        state.cursor_y = y;
    }
}
