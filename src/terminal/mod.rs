//! Terminal module: a true-colour terminal as the display window.
//!
//! - [`Cell`]/[`CellGrid`]: half-block cells, two canvas pixels each
//! - [`diff`]: minimal ANSI output between frames
//! - [`OutputBuffer`]: single-syscall frame output
//! - [`TerminalWindow`]: the [`Window`](crate::render::Window) implementation

mod cell;
pub mod diff;
mod output;
mod window;

pub use cell::{Cell, CellGrid, Rgb};
pub use output::OutputBuffer;
pub use window::TerminalWindow;
