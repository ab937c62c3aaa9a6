// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Real-terminal [`Screen`] backed by crossterm.
//!
//! The terminal holds no window concept of its own, so windows are emulated
//! over a single cell grid: draw calls land in the grid immediately and
//! `refresh` repaints the grid through crossterm.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode as CtKeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
            SetForegroundColor},
    terminal::{disable_raw_mode, enable_raw_mode, size, Clear, ClearType,
               EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::keys::{self, KeyCode};
use crate::layout::Rect;

use super::{Screen, TextAttr, WindowId, COLOR_PAIRS};

const ATTR_STANDOUT: u8 = 1;
const ATTR_UNDERLINE: u8 = 2;
const ATTR_REVERSE: u8 = 4;
const ATTR_BLINK: u8 = 8;
const ATTR_DIM: u8 = 16;
const ATTR_BOLD: u8 = 32;

fn attr_bit(attr: TextAttr) -> u8 {
    match attr {
        TextAttr::Standout => ATTR_STANDOUT,
        TextAttr::Underline => ATTR_UNDERLINE,
        TextAttr::Reverse => ATTR_REVERSE,
        TextAttr::Blink => ATTR_BLINK,
        TextAttr::Dim => ATTR_DIM,
        TextAttr::Bold => ATTR_BOLD,
    }
}

/// The eight base terminal colors in their conventional order.
fn base_color(index: u8) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::DarkRed,
        2 => Color::DarkGreen,
        3 => Color::DarkYellow,
        4 => Color::DarkBlue,
        5 => Color::DarkMagenta,
        6 => Color::DarkCyan,
        _ => Color::Grey,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    attrs: u8,
    pair: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', attrs: 0, pair: 0 }
    }
}

struct Window {
    rect: Rect,
    cursor_x: u16,
    cursor_y: u16,
    attrs: u8,
    pair: u8,
}

pub struct CrosstermScreen {
    width: u16,
    height: u16,
    grid: Vec<Cell>,
    windows: Vec<Window>,
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

impl CrosstermScreen {
    /// Enters raw mode and the alternate screen. The terminal is restored
    /// on drop, so diagnostics printed afterwards land on the real screen.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let (width, height) = size().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self {
            width,
            height,
            grid: vec![Cell::default(); usize::from(width) * usize::from(height)],
            windows: Vec::new(),
        })
    }

    fn cell_index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    fn put(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(index) = self.cell_index(x, y) {
            self.grid[index] = cell;
        }
    }

    /// Writes `text` at the window cursor, advancing it. `wrap` continues
    /// on the next window row; otherwise the overflow is dropped.
    fn write_text(&mut self, id: WindowId, text: &str, wrap: bool) {
        let Some(window) = self.windows.get(id.raw()) else {
            return;
        };
        let rect = window.rect;
        let attrs = window.attrs;
        let pair = window.pair;
        let (mut cx, mut cy) = (window.cursor_x, window.cursor_y);

        for ch in text.chars() {
            if cx >= rect.width {
                if !wrap {
                    break;
                }
                cx = 0;
                cy += 1;
            }
            if cy >= rect.height {
                break;
            }
            self.put(rect.x + cx, rect.y + cy, Cell { ch, attrs, pair });
            cx += 1;
        }

        if let Some(window) = self.windows.get_mut(id.raw()) {
            window.cursor_x = cx;
            window.cursor_y = cy;
        }
    }

    fn map_key(event: KeyEvent) -> Option<KeyCode> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let code = match event.code {
            CtKeyCode::Char(c) => {
                if event.modifiers.contains(KeyModifiers::CONTROL) {
                    (c.to_ascii_uppercase() as KeyCode) & 0x1f
                } else {
                    c as KeyCode
                }
            }
            CtKeyCode::Enter => '\n' as KeyCode,
            CtKeyCode::Down => keys::KEY_DOWN,
            CtKeyCode::Up => keys::KEY_UP,
            CtKeyCode::Left => keys::KEY_LEFT,
            CtKeyCode::Right => keys::KEY_RIGHT,
            CtKeyCode::Home => keys::KEY_HOME,
            CtKeyCode::End => keys::KEY_END,
            CtKeyCode::PageDown => keys::KEY_PAGE_DOWN,
            CtKeyCode::PageUp => keys::KEY_PAGE_UP,
            _ => return None,
        };
        Some(code)
    }
}

impl Screen for CrosstermScreen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn create_window(&mut self, rect: Rect) -> WindowId {
        self.windows.push(Window { rect, cursor_x: 0, cursor_y: 0, attrs: 0, pair: 0 });
        WindowId::from_raw(self.windows.len() - 1)
    }

    fn resize_window(&mut self, id: WindowId, rect: Rect) {
        if let Some(window) = self.windows.get_mut(id.raw()) {
            window.rect = rect;
            window.cursor_x = 0;
            window.cursor_y = 0;
        }
    }

    fn erase(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(id.raw()) else {
            return;
        };
        window.cursor_x = 0;
        window.cursor_y = 0;
        let rect = window.rect;
        for y in 0..rect.height {
            for x in 0..rect.width {
                self.put(rect.x + x, rect.y + y, Cell::default());
            }
        }
    }

    fn erase_all(&mut self) {
        self.grid.fill(Cell::default());
        for window in &mut self.windows {
            window.cursor_x = 0;
            window.cursor_y = 0;
        }
    }

    fn move_to(&mut self, id: WindowId, x: u16, y: u16) {
        if let Some(window) = self.windows.get_mut(id.raw()) {
            window.cursor_x = x;
            window.cursor_y = y;
        }
    }

    fn print(&mut self, id: WindowId, text: &str) {
        self.write_text(id, text, true);
    }

    fn print_clipped(&mut self, id: WindowId, text: &str) {
        self.write_text(id, text, false);
    }

    fn set_attr(&mut self, id: WindowId, attr: TextAttr, on: bool) {
        if let Some(window) = self.windows.get_mut(id.raw()) {
            if on {
                window.attrs |= attr_bit(attr);
            } else {
                window.attrs &= !attr_bit(attr);
            }
        }
    }

    fn set_color(&mut self, id: WindowId, pair: u8, on: bool) {
        if let Some(window) = self.windows.get_mut(id.raw()) {
            if on && (1..=COLOR_PAIRS).contains(&pair) {
                window.pair = pair;
            } else {
                window.pair = 0;
            }
        }
    }

    fn refresh(&mut self) -> io::Result<()> {
        let mut out = io::stdout();
        queue!(
            out,
            MoveTo(0, 0),
            Clear(ClearType::All),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;

        let mut current = Cell { ch: '\0', attrs: 0, pair: 0 };
        for y in 0..self.height {
            queue!(out, MoveTo(0, y))?;
            for x in 0..self.width {
                let cell = self.grid[usize::from(y) * usize::from(self.width) + usize::from(x)];
                if cell.attrs != current.attrs || cell.pair != current.pair {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                    if cell.attrs & (ATTR_STANDOUT | ATTR_REVERSE) != 0 {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    if cell.attrs & ATTR_UNDERLINE != 0 {
                        queue!(out, SetAttribute(Attribute::Underlined))?;
                    }
                    if cell.attrs & ATTR_BLINK != 0 {
                        queue!(out, SetAttribute(Attribute::SlowBlink))?;
                    }
                    if cell.attrs & ATTR_DIM != 0 {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                    if cell.attrs & ATTR_BOLD != 0 {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if cell.pair != 0 {
                        queue!(
                            out,
                            SetForegroundColor(base_color((cell.pair - 1) / 8)),
                            SetBackgroundColor(base_color((cell.pair - 1) % 8)),
                        )?;
                    }
                    current = cell;
                }
                queue!(out, Print(cell.ch))?;
            }
        }
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        out.flush()
    }

    fn read_key(&mut self) -> io::Result<KeyCode> {
        loop {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(code) = Self::map_key(key) {
                        return Ok(code);
                    }
                }
                Event::Resize(width, height) => {
                    self.width = width;
                    self.height = height;
                    self.grid = vec![
                        Cell::default();
                        usize::from(width) * usize::from(height)
                    ];
                    return Ok(keys::KEY_RESIZE);
                }
                _ => {}
            }
        }
    }

    fn flush_input(&mut self) -> io::Result<()> {
        while event::poll(std::time::Duration::ZERO)? {
            let _ = event::read()?;
        }
        Ok(())
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        teardown_terminal();
    }
}
