// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Session state machine.
//!
//! One [`SessionState`] instance carries everything the editor knows about
//! the current sitting: which mode is active, where the cursor is, what the
//! status bar shows, and the panel layout. The cursor arithmetic lives in
//! [`cursor`], the key dispatch protocol in [`dispatch`].

pub mod cursor;
pub mod dispatch;


use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::keys::{self, KeyCode};
use crate::layout::{PanelArena, Viewport};
use crate::term::WindowId;

pub use dispatch::{CallbackError, HandlerVerdict, KeyHandlerFn, Permissions};

pub type SharedSession = Rc<RefCell<SessionState>>;

/// Top-level editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Idle screen; only the exit key does anything.
    #[default]
    Default,
    /// The hex view, where all editing happens.
    Hex,
    /// Menu listing registered info notes.
    InfoAsking,
    /// Scrollable text of one info note.
    Info,
}

/// Sub-mode of the hex view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexViewState {
    #[default]
    Default,
    Editing,
}

/// Which half of the selected byte an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NibblePos {
    #[default]
    High,
    Low,
}

/// Pending yes/no question shown in the bar. While one is up, the next key
/// answers it instead of reaching the normal key ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prompt {
    #[default]
    None,
    ConfirmExit,
    ConfirmSave,
}

pub struct SessionState {
    mode: Mode,
    hex_state: HexViewState,
    nibble: NibblePos,
    prompt: Prompt,
    sel_pos: u64,
    row_pos: u64,
    should_exit: bool,
    quick_exit: bool,
    last_key: KeyCode,
    bar_message: String,
    edit_move_forward: bool,
    viewport: Viewport,
    panels: PanelArena,
    info_selected: usize,
    info_row: usize,
    info_text: Vec<String>,
    config_path: PathBuf,
    view_window: Option<WindowId>,
    bar_window: Option<WindowId>,
}

impl SessionState {
    pub fn new(width: u16, height: u16, config_path: PathBuf) -> Self {
        Self {
            mode: Mode::Hex,
            hex_state: HexViewState::Default,
            nibble: NibblePos::High,
            prompt: Prompt::None,
            sel_pos: 0,
            row_pos: 0,
            should_exit: false,
            quick_exit: false,
            last_key: keys::KEY_NONE,
            bar_message: String::new(),
            edit_move_forward: true,
            viewport: Viewport::from_terminal(width, height),
            panels: PanelArena::default(),
            info_selected: 0,
            info_row: 0,
            info_text: Vec::new(),
            config_path,
            view_window: None,
            bar_window: None,
        }
    }

    pub fn shared(width: u16, height: u16, config_path: PathBuf) -> SharedSession {
        Rc::new(RefCell::new(Self::new(width, height, config_path)))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn hex_state(&self) -> HexViewState {
        self.hex_state
    }

    pub fn set_hex_state(&mut self, state: HexViewState) {
        self.hex_state = state;
    }

    pub fn nibble(&self) -> NibblePos {
        self.nibble
    }

    pub fn set_nibble(&mut self, nibble: NibblePos) {
        self.nibble = nibble;
    }

    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    /// Raises a prompt, replacing the bar text with its question.
    pub fn raise_prompt(&mut self, prompt: Prompt, question: &str) {
        self.prompt = prompt;
        self.bar_message = question.to_owned();
    }

    /// Dismisses the prompt and restores control of the bar message.
    pub fn clear_prompt(&mut self) {
        self.prompt = Prompt::None;
        self.bar_message.clear();
    }

    pub fn selected_pos(&self) -> u64 {
        self.sel_pos
    }

    pub fn set_selected_pos(&mut self, pos: u64) {
        self.sel_pos = pos;
    }

    pub fn row_pos(&self) -> u64 {
        self.row_pos
    }

    pub fn set_row_pos(&mut self, row: u64) {
        self.row_pos = row;
    }

    /// First byte offset visible in the hex view.
    pub fn row_offset(&self) -> u64 {
        self.row_pos * self.viewport.bytes_per_row(&self.panels)
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn set_should_exit(&mut self, value: bool) {
        self.should_exit = value;
    }

    pub fn quick_exit(&self) -> bool {
        self.quick_exit
    }

    pub fn set_quick_exit(&mut self, value: bool) {
        self.quick_exit = value;
    }

    pub fn last_key(&self) -> KeyCode {
        self.last_key
    }

    pub fn set_last_key(&mut self, key: KeyCode) {
        self.last_key = key;
    }

    pub fn bar_message(&self) -> &str {
        &self.bar_message
    }

    /// Sets the bar message unless a prompt owns the bar right now.
    pub fn set_bar_message(&mut self, message: &str) {
        if self.prompt == Prompt::None {
            self.bar_message = message.to_owned();
        }
    }

    pub fn clear_bar_message(&mut self) {
        if self.prompt == Prompt::None {
            self.bar_message.clear();
        }
    }

    pub fn edit_move_forward(&self) -> bool {
        self.edit_move_forward
    }

    pub fn set_edit_move_forward(&mut self, value: bool) {
        self.edit_move_forward = value;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn panels(&self) -> &PanelArena {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut PanelArena {
        &mut self.panels
    }

    /// Bytes shown per row given the current terminal and panel widths.
    pub fn bytes_per_row(&self) -> u64 {
        self.viewport.bytes_per_row(&self.panels)
    }

    /// Rows of the hex view, as a byte-offset multiplier.
    pub fn visible_rows(&self) -> u64 {
        u64::from(self.viewport.hex_height())
    }

    /// Bytes that fit on one screenful of the hex view.
    pub fn page_size(&self) -> u64 {
        self.bytes_per_row() * self.visible_rows()
    }

    pub fn info_selected(&self) -> usize {
        self.info_selected
    }

    pub fn set_info_selected(&mut self, index: usize) {
        self.info_selected = index;
    }

    pub fn info_row(&self) -> usize {
        self.info_row
    }

    pub fn set_info_row(&mut self, row: usize) {
        self.info_row = row;
    }

    /// Lines of the info note currently shown, fetched when the note is
    /// opened.
    pub fn info_text(&self) -> &[String] {
        &self.info_text
    }

    pub fn set_info_text(&mut self, lines: Vec<String>) {
        self.info_text = lines;
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn view_window(&self) -> Option<WindowId> {
        self.view_window
    }

    pub fn set_view_window(&mut self, id: WindowId) {
        self.view_window = Some(id);
    }

    pub fn bar_window(&self) -> Option<WindowId> {
        self.bar_window
    }

    pub fn set_bar_window(&mut self, id: WindowId) {
        self.bar_window = Some(id);
    }
}
