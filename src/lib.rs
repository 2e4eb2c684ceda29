//! A VT/xterm-compatible terminal emulator engine.
//!
//! This crate owns the byte-stream-driven state machine, screen/scrollback
//! model, and input translator for a character-cell terminal application. It
//! does not render anything: collaborators subscribe to [`event::Event`]s and
//! hand back [`input`] events of their own.

#[macro_use]
extern crate bitflags;

use std::ops::Range;

pub mod cell;
pub mod charset;
pub mod color;
pub mod config;
pub mod engine;
pub mod event;
pub mod input;
pub mod line;
pub mod mouse;
mod parser;
pub mod scheduler;
pub mod screen;
mod tabs;

#[cfg(test)]
mod test;

pub use cell::{Cell, Style};
pub use color::{ColorPalette, RgbColor};
pub use config::EngineOptions;
pub use engine::Engine;
pub use event::Event;

/// Index into the visible viewport. Row 0 is the top row currently on
/// screen; it is not an index into the scrollback-inclusive buffer (see
/// [`screen::Screen`] for that, `PhysRowIndex`).
pub type VisibleRowIndex = i64;

/// Index into the scrollback-inclusive line buffer. Index 0 is the oldest
/// scrollback row (or the top of the screen, if there is no scrollback yet).
pub type PhysRowIndex = usize;

/// A half-open row range used for dirty tracking and refresh notification.
pub type RowRange = Range<VisibleRowIndex>;

/// A cursor position relative to the top-left of the visible viewport.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CursorPosition {
    pub x: usize,
    pub y: VisibleRowIndex,
}

/// The reply wezterm-style clients expect from `CSI c` (DA1) when
/// `term_name` is "xterm", "rxvt" or "screen".
pub const DA1_XTERM: &[u8] = b"\x1b[?1;2c";
/// DA1 reply when `term_name` is "linux".
pub const DA1_LINUX: &[u8] = b"\x1b[?6c";

pub(crate) const CSI: &[u8] = b"\x1b[";
pub(crate) const OSC: &[u8] = b"\x1b]";
pub(crate) const DCS: &[u8] = b"\x1bP";
pub(crate) const ST: &[u8] = b"\x1b\\";
