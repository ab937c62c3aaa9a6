// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! In-memory [`Screen`] for tests: keys come from a scripted queue and
//! every draw call is recorded for assertions.

use std::collections::VecDeque;
use std::io;

use crate::keys::KeyCode;
use crate::layout::Rect;

use super::{Screen, TextAttr, WindowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    CreateWindow(Rect),
    ResizeWindow(WindowId, Rect),
    Erase(WindowId),
    EraseAll,
    MoveTo(WindowId, u16, u16),
    Print(WindowId, String),
    PrintClipped(WindowId, String),
    SetAttr(WindowId, TextAttr, bool),
    SetColor(WindowId, u8, bool),
    Refresh,
    FlushInput,
}

pub struct RecordingScreen {
    width: u16,
    height: u16,
    keys: VecDeque<KeyCode>,
    ops: Vec<RecordedOp>,
    windows: usize,
}

impl RecordingScreen {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, keys: VecDeque::new(), ops: Vec::new(), windows: 0 }
    }

    /// Appends keys the next `read_key` calls will return in order.
    pub fn script_keys(&mut self, keys: impl IntoIterator<Item = KeyCode>) {
        self.keys.extend(keys);
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<RecordedOp> {
        std::mem::take(&mut self.ops)
    }

    /// All text printed to `id`, in draw order.
    pub fn printed_text(&self, id: WindowId) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Print(window, text) | RecordedOp::PrintClipped(window, text)
                    if *window == id =>
                {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

impl Screen for RecordingScreen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn create_window(&mut self, rect: Rect) -> WindowId {
        self.ops.push(RecordedOp::CreateWindow(rect));
        let id = WindowId::from_raw(self.windows);
        self.windows += 1;
        id
    }

    fn resize_window(&mut self, id: WindowId, rect: Rect) {
        self.ops.push(RecordedOp::ResizeWindow(id, rect));
    }

    fn erase(&mut self, id: WindowId) {
        self.ops.push(RecordedOp::Erase(id));
    }

    fn erase_all(&mut self) {
        self.ops.push(RecordedOp::EraseAll);
    }

    fn move_to(&mut self, id: WindowId, x: u16, y: u16) {
        self.ops.push(RecordedOp::MoveTo(id, x, y));
    }

    fn print(&mut self, id: WindowId, text: &str) {
        self.ops.push(RecordedOp::Print(id, text.to_owned()));
    }

    fn print_clipped(&mut self, id: WindowId, text: &str) {
        self.ops.push(RecordedOp::PrintClipped(id, text.to_owned()));
    }

    fn set_attr(&mut self, id: WindowId, attr: TextAttr, on: bool) {
        self.ops.push(RecordedOp::SetAttr(id, attr, on));
    }

    fn set_color(&mut self, id: WindowId, pair: u8, on: bool) {
        self.ops.push(RecordedOp::SetColor(id, pair, on));
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.ops.push(RecordedOp::Refresh);
        Ok(())
    }

    /// Running out of scripted keys is a test bug; fail loudly instead of
    /// spinning the event loop.
    fn read_key(&mut self) -> io::Result<KeyCode> {
        self.keys.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted key queue is empty")
        })
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.ops.push(RecordedOp::FlushInput);
        Ok(())
    }
}
