//! Terminal window: shows the canvas in the controlling terminal.

use super::cell::{Cell, CellGrid, Rgb};
use super::diff::{render_diff, render_full, DiffState};
use super::output::OutputBuffer;
use crate::render::{Canvas, RenderError, Rect, Window};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use std::io::{self, Stdout};
use std::time::Duration;

/// A [`Window`] drawing half-block cells to stdout.
///
/// The canvas is downsampled by a whole factor so it fits the terminal at
/// the time the window opens. The terminal is restored on drop.
pub struct TerminalWindow {
    stdout: Stdout,
    current: CellGrid,
    next: CellGrid,
    state: DiffState,
    output: OutputBuffer,
    /// Canvas pixels per cell column, and per half-cell row.
    scale: u32,
    first_frame: bool,
}

impl TerminalWindow {
    /// Enter raw mode and the alternate screen, sized for a
    /// `width` x `height` canvas.
    pub fn open(width: u16, height: u16) -> Result<Self, RenderError> {
        let (cols, rows) = terminal::size()?;
        let scale = fit_scale(width, height, cols, rows);
        let grid_w = u16::try_from(u32::from(width).div_ceil(scale)).unwrap_or(cols).min(cols);
        let grid_h = u16::try_from(u32::from(height).div_ceil(scale * 2))
            .unwrap_or(rows)
            .min(rows);

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        tracing::info!(width, height, cols = grid_w, rows = grid_h, scale, "opened terminal window");
        Ok(Self {
            stdout,
            current: CellGrid::new(grid_w, grid_h),
            next: CellGrid::new(grid_w, grid_h),
            state: DiffState::new(),
            output: OutputBuffer::default(),
            scale,
            first_frame: true,
        })
    }

    /// Resample the cells covering `region` (cell coordinates).
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn sample(&mut self, canvas: &Canvas, region: Rect) {
        let bounds = Rect::from_size(u32::from(self.next.width()), u32::from(self.next.height()));
        let Some(region) = region.intersection(&bounds) else {
            return;
        };
        for y in region.y as u16..region.bottom() as u16 {
            for x in region.x as u16..region.right() as u16 {
                let px = u32::from(x) * self.scale;
                let top_y = u32::from(y) * 2 * self.scale;
                let pixel = |py: u32| canvas.get(px, py).map_or(Rgb::BLACK, Rgb::from);
                self.next
                    .set(x, y, Cell::new(pixel(top_y), pixel(top_y + self.scale)));
            }
        }
    }
}

/// Smallest whole downsampling factor that fits the canvas in the terminal.
fn fit_scale(width: u16, height: u16, cols: u16, rows: u16) -> u32 {
    let cols = u32::from(cols.max(1));
    let rows = u32::from(rows.max(1)) * 2;
    let sx = u32::from(width).div_ceil(cols);
    let sy = u32::from(height).div_ceil(rows);
    sx.max(sy).max(1)
}

/// Convert a canvas-pixel rectangle to the cells it touches.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn to_cells(rect: Rect, scale: u32) -> Rect {
    let sx = scale as i32;
    let sy = (scale * 2) as i32;
    let x0 = rect.x.max(0) / sx;
    let y0 = rect.y.max(0) / sy;
    let x1 = (rect.right().max(0) + sx - 1) / sx;
    let y1 = (rect.bottom().max(0) + sy - 1) / sy;
    Rect::new(x0, y0, (x1 - x0).max(0) as u32, (y1 - y0).max(0) as u32)
}

impl Window for TerminalWindow {
    fn present(&mut self, canvas: &Canvas, dirty: &[Rect]) -> Result<(), RenderError> {
        self.output.clear();
        self.output.begin_frame();
        let header = self.output.len();

        if self.first_frame {
            let all = Rect::from_size(u32::from(self.next.width()), u32::from(self.next.height()));
            self.sample(canvas, all);
            render_full(&self.next, &mut self.output, &mut self.state);
            self.first_frame = false;
        } else {
            let regions: Vec<Rect> = dirty.iter().map(|r| to_cells(*r, self.scale)).collect();
            if regions.is_empty() {
                return Ok(());
            }
            for region in &regions {
                self.sample(canvas, *region);
            }
            render_diff(&self.current, &self.next, &regions, &mut self.output, &mut self.state);
        }

        if self.output.len() > header {
            self.output.end_frame();
            self.output.flush_to(&mut self.stdout)?;
        }
        self.current.copy_from(&self.next);
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        while let Ok(true) = event::poll(Duration::ZERO) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                return true;
            }
        }
        false
    }
}

impl Drop for TerminalWindow {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = execute!(
            self.stdout,
            crossterm::style::ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scale() {
        // 80x48 pixels fit an 80x24 terminal one-to-one
        assert_eq!(fit_scale(80, 48, 80, 24), 1);
        assert_eq!(fit_scale(640, 480, 80, 24), 10);
        assert_eq!(fit_scale(10, 10, 0, 0), 10);
    }

    #[test]
    fn test_to_cells() {
        assert_eq!(to_cells(Rect::new(0, 0, 4, 4), 1), Rect::new(0, 0, 4, 2));
        assert_eq!(to_cells(Rect::new(5, 3, 10, 10), 2), Rect::new(2, 0, 6, 4));
        assert_eq!(to_cells(Rect::new(-8, -8, 4, 4), 1), Rect::ZERO);
    }
}
