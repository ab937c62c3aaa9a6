// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Terminal backend seam.
//!
//! [`Screen`] is the drawing and input contract the editor runs against.
//! [`CrosstermScreen`] implements it on a real terminal; tests drive the
//! editor through [`RecordingScreen`] with a scripted key queue instead.

mod crossterm_screen;
mod recording;

pub use crossterm_screen::CrosstermScreen;
pub use recording::{RecordedOp, RecordingScreen};

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::keys::KeyCode;
use crate::layout::Rect;

pub type SharedScreen = Rc<RefCell<dyn Screen>>;

/// Handle to one rectangular drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(usize);

impl WindowId {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

/// Text attributes guest code can toggle while drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttr {
    Standout,
    Underline,
    Reverse,
    Blink,
    Dim,
    Bold,
}

impl TextAttr {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Standout),
            1 => Some(Self::Underline),
            2 => Some(Self::Reverse),
            3 => Some(Self::Blink),
            4 => Some(Self::Dim),
            5 => Some(Self::Bold),
            _ => None,
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Self::Standout => 0,
            Self::Underline => 1,
            Self::Reverse => 2,
            Self::Blink => 3,
            Self::Dim => 4,
            Self::Bold => 5,
        }
    }
}

/// Number of foreground/background color pairs guest code can pick from.
/// Pair ids run 1 through 64; pair `id` maps to foreground `(id-1)/8` and
/// background `(id-1)%8` of the eight base terminal colors.
pub const COLOR_PAIRS: u8 = 64;

/// Drawing and input surface.
///
/// Draw calls are buffered; nothing reaches the terminal until `refresh`.
/// Each window keeps its own cursor, advanced by `print`. Printing wraps at
/// the window edge; `print_clipped` truncates instead.
pub trait Screen {
    /// Terminal size as (width, height).
    fn size(&self) -> (u16, u16);

    fn create_window(&mut self, rect: Rect) -> WindowId;

    fn resize_window(&mut self, id: WindowId, rect: Rect);

    /// Blanks the window and resets its cursor.
    fn erase(&mut self, id: WindowId);

    fn erase_all(&mut self);

    fn move_to(&mut self, id: WindowId, x: u16, y: u16);

    fn print(&mut self, id: WindowId, text: &str);

    fn print_clipped(&mut self, id: WindowId, text: &str);

    fn set_attr(&mut self, id: WindowId, attr: TextAttr, on: bool);

    /// Selects (or deselects) a color pair for subsequent printing. Pair 0
    /// and out-of-range ids fall back to the terminal default.
    fn set_color(&mut self, id: WindowId, pair: u8, on: bool);

    /// Pushes everything drawn since the last refresh to the terminal.
    fn refresh(&mut self) -> io::Result<()>;

    /// Blocks for the next key press. Terminal resizes surface as
    /// [`crate::keys::KEY_RESIZE`] after the new size has been recorded.
    fn read_key(&mut self) -> io::Result<KeyCode>;

    /// Discards any queued input events.
    fn flush_input(&mut self) -> io::Result<()>;
}
