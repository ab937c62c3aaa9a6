// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! The editor itself: the key-driven event loop over the session state
//! machine, and the drawing pass.
//!
//! Every piece of shared state is behind `Rc<RefCell<_>>` so the scripting
//! host can reach the same data from callbacks. To keep that sound, no
//! borrow is held while a registered callback runs; handler and listener
//! lists are snapshotted first.

#[cfg(test)]
mod tests;

use std::fmt;
use std::io;
use std::process;

use crate::bytes;
use crate::diag::SharedDiag;
use crate::ext::SharedExtensions;
use crate::keys::{self, KeyCode};
use crate::session::dispatch::{self, CallbackError};
use crate::session::{HexViewState, Mode, NibblePos, Prompt, SessionState, SharedSession};
use crate::store::{FileBuffer, SharedStore, StoreError};
use crate::term::{SharedScreen, TextAttr, WindowId};

const MSG_READ_ONLY_SAVE: &str = "Cannot save in read only mode.";
const MSG_READ_ONLY_EDIT: &str = "Cannot edit in read only mode.";
const MSG_NO_CHANGES: &str = "No changes to save.";
const MSG_SAVED: &str = "Saved.";
const MSG_NOTHING_TO_UNDO: &str = "Could not undo.";
const MSG_NOTHING_TO_REDO: &str = "Could not redo.";
const PROMPT_EXIT: &str = "Exit without saving? (y/n)";
const PROMPT_SAVE: &str = "Save changes? (y/n)";

/// Error that unwinds one event cycle (and with it, the editor).
#[derive(Debug)]
pub enum CycleError {
    Io(io::Error),
    Callback(CallbackError),
    Store(StoreError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "terminal i/o failed: {err}"),
            Self::Callback(err) => err.fmt(f),
            Self::Store(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Callback(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<io::Error> for CycleError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<CallbackError> for CycleError {
    fn from(err: CallbackError) -> Self {
        Self::Callback(err)
    }
}

impl From<StoreError> for CycleError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

pub struct Editor {
    session: SharedSession,
    store: SharedStore,
    ext: SharedExtensions,
    screen: SharedScreen,
    diag: SharedDiag,
}

impl Editor {
    pub fn new(
        session: SharedSession,
        store: SharedStore,
        ext: SharedExtensions,
        screen: SharedScreen,
        diag: SharedDiag,
    ) -> Self {
        Self { session, store, ext, screen, diag }
    }

    /// Runs the editor until an exit is requested or a cycle fails.
    pub fn run(&mut self) -> Result<(), CycleError> {
        self.handle_init()?;
        loop {
            let key = self.screen.borrow_mut().read_key()?;
            self.handle_event(key)?;

            let (exit, quick) = {
                let session = self.session.borrow();
                (session.should_exit(), session.quick_exit())
            };
            if exit {
                if quick {
                    // Skips terminal teardown and the diagnostic flush.
                    process::exit(0);
                }
                return Ok(());
            }
        }
    }

    /// First cycle: windows are created, init listeners fire once, and the
    /// initial frame is drawn.
    pub fn handle_init(&mut self) -> Result<(), CycleError> {
        let (view_rect, bar_rect) = {
            let session = self.session.borrow();
            (session.viewport().main(), session.viewport().bar())
        };
        {
            let mut screen = self.screen.borrow_mut();
            let view = screen.create_window(view_rect);
            let bar = screen.create_window(bar_rect);
            let mut session = self.session.borrow_mut();
            session.set_view_window(view);
            session.set_bar_window(bar);
        }

        let listeners = self.ext.borrow_mut().take_init_listeners();
        for listener in listeners {
            listener()?;
        }

        self.draw()
    }

    /// One full event cycle: dispatch, built-in actions, draw, input flush.
    pub fn handle_event(&mut self, key: KeyCode) -> Result<(), CycleError> {
        self.session.borrow_mut().set_last_key(key);

        let handlers = self.ext.borrow().key_handler_snapshot();
        let permissions = dispatch::run_chain(&handlers, key)?;

        if permissions.functional {
            self.handle_functional(key)?;
        }
        if permissions.special {
            self.handle_special(key)?;
        }
        if permissions.drawing {
            self.draw()?;
        }

        self.screen.borrow_mut().flush_input()?;
        Ok(())
    }

    fn handle_functional(&mut self, key: KeyCode) -> Result<(), CycleError> {
        let prompt = self.session.borrow().prompt();
        if prompt != Prompt::None {
            return self.answer_prompt(prompt, key);
        }

        let mode = self.session.borrow().mode();
        match mode {
            Mode::Default => {
                if keys::is_exit_key(key) {
                    self.session.borrow_mut().set_should_exit(true);
                }
                Ok(())
            }
            Mode::Hex => self.handle_functional_hex(key),
            Mode::InfoAsking => self.handle_functional_info_asking(key),
            Mode::Info => {
                self.handle_functional_info(key);
                Ok(())
            }
        }
    }

    /// A raised prompt swallows the key. Only an explicit yes proceeds;
    /// any other printable key (plus enter for the exit question) dismisses
    /// it, and everything else leaves it up.
    fn answer_prompt(&mut self, prompt: Prompt, key: KeyCode) -> Result<(), CycleError> {
        let dismisses = match prompt {
            Prompt::ConfirmExit => bytes::is_displayable(key) || keys::is_enter_key(key),
            Prompt::ConfirmSave => bytes::is_displayable(key),
            Prompt::None => true,
        };
        if !dismisses {
            return Ok(());
        }
        self.session.borrow_mut().clear_prompt();
        if !keys::is_yes_key(key) {
            return Ok(());
        }
        match prompt {
            Prompt::ConfirmExit => {
                self.session.borrow_mut().set_should_exit(true);
                Ok(())
            }
            Prompt::ConfirmSave => self.save_file(),
            Prompt::None => Ok(()),
        }
    }

    fn handle_functional_hex(&mut self, key: KeyCode) -> Result<(), CycleError> {
        let editing = self.session.borrow().hex_state() == HexViewState::Editing;
        if editing {
            self.handle_hex_editing(key)?;
        } else {
            self.handle_hex_default(key)?;
        }
        self.session.borrow_mut().update_row_position();
        Ok(())
    }

    fn handle_hex_default(&mut self, key: KeyCode) -> Result<(), CycleError> {
        let file_end = self.store.borrow().file_end();
        let mut session = self.session.borrow_mut();

        if keys::is_exit_key(key) {
            session.raise_prompt(Prompt::ConfirmExit, PROMPT_EXIT);
        } else if keys::is_save_key(key) {
            Self::request_save(&mut session, &self.store.borrow());
        } else if keys::is_undo_key(key) {
            drop(session);
            self.undo_edit()?;
        } else if keys::is_redo_key(key) {
            drop(session);
            self.redo_edit()?;
        } else if keys::is_enter_key(key) {
            session.set_hex_state(HexViewState::Editing);
            session.set_nibble(NibblePos::High);
        } else if keys::is_question_key(key) {
            session.set_mode(Mode::InfoAsking);
            session.set_info_selected(0);
        } else {
            Self::apply_movement(&mut session, key, file_end);
        }
        Ok(())
    }

    fn handle_hex_editing(&mut self, key: KeyCode) -> Result<(), CycleError> {
        let file_end = self.store.borrow().file_end();
        let mut session = self.session.borrow_mut();

        if keys::is_enter_key(key) || keys::is_exit_key(key) {
            session.set_hex_state(HexViewState::Default);
            session.set_nibble(NibblePos::High);
        } else if keys::is_hex_digit_key(key) {
            // Checked before undo/redo so the digit keys a-f still edit.
            drop(session);
            self.edit_nibble(key, file_end)?;
        } else if keys::is_save_key(key) {
            Self::request_save(&mut session, &self.store.borrow());
        } else if keys::is_undo_key(key) {
            drop(session);
            self.undo_edit()?;
        } else if keys::is_redo_key(key) {
            drop(session);
            self.redo_edit()?;
        } else if keys::is_question_key(key) {
            session.set_mode(Mode::InfoAsking);
            session.set_info_selected(0);
        } else if keys::is_left_key(key) {
            session.move_left_editing();
        } else if keys::is_right_key(key) {
            session.move_right_editing(file_end);
        } else {
            Self::apply_movement(&mut session, key, file_end);
        }
        Ok(())
    }

    /// Raises the save confirmation, or reports why a save cannot happen.
    fn request_save(session: &mut SessionState, store: &FileBuffer) {
        if store.is_read_only() {
            session.set_bar_message(MSG_READ_ONLY_SAVE);
        } else if !store.has_unsaved_edits() {
            session.set_bar_message(MSG_NO_CHANGES);
        } else {
            session.raise_prompt(Prompt::ConfirmSave, PROMPT_SAVE);
        }
    }

    /// Movement shared by both hex sub-modes. Unrecognized keys are
    /// ignored.
    fn apply_movement(session: &mut SessionState, key: KeyCode, file_end: u64) {
        if keys::is_down_key(key) {
            session.move_down(file_end);
        } else if keys::is_up_key(key) {
            session.move_up();
        } else if keys::is_left_key(key) {
            session.move_left();
        } else if keys::is_right_key(key) {
            session.move_right(file_end);
        } else if keys::is_page_down_key(key) {
            session.page_down(file_end);
        } else if keys::is_page_up_key(key) {
            session.page_up();
        } else if keys::is_home_key(key) {
            session.jump_start_of_line();
        } else if keys::is_end_key(key) {
            session.jump_end_of_line(file_end);
        } else if keys::is_end_of_file_key(key) {
            session.jump_end_of_file(file_end);
        }
    }

    /// Applies a hex digit to the selected nibble, then advances half a
    /// byte (or a full byte when configured to move on).
    fn edit_nibble(&mut self, key: KeyCode, file_end: u64) -> Result<(), CycleError> {
        let Some(digit) = char::from_u32(key as u32).and_then(bytes::hex_char_value) else {
            return Ok(());
        };

        let pos = self.session.borrow().selected_pos();
        let Some(current) = self.store.borrow_mut().read(pos) else {
            return Ok(());
        };
        let nibble = self.session.borrow().nibble();
        let value = match nibble {
            NibblePos::High => bytes::set_high_nibble(current, digit),
            NibblePos::Low => bytes::set_low_nibble(current, digit),
        };

        match self.store.borrow_mut().edit(pos, value) {
            Ok(()) => {}
            Err(StoreError::ReadOnly) => {
                self.session.borrow_mut().set_bar_message(MSG_READ_ONLY_EDIT);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        let mut session = self.session.borrow_mut();
        match nibble {
            NibblePos::High => session.set_nibble(NibblePos::Low),
            NibblePos::Low => {
                session.set_nibble(NibblePos::High);
                if session.edit_move_forward() {
                    session.move_right(file_end);
                }
            }
        }
        Ok(())
    }

    pub fn undo_edit(&mut self) -> Result<(), CycleError> {
        let step = self.store.borrow_mut().undo();
        match step {
            Some(step) => {
                self.session
                    .borrow_mut()
                    .set_bar_message(&format!("Undid {} byte(s).", step.bytes.len()));
                let listeners = self.ext.borrow().undo_listener_snapshot();
                for listener in listeners {
                    listener(step.pos)?;
                }
            }
            None => self.session.borrow_mut().set_bar_message(MSG_NOTHING_TO_UNDO),
        }
        Ok(())
    }

    pub fn redo_edit(&mut self) -> Result<(), CycleError> {
        let step = self.store.borrow_mut().redo();
        match step {
            Some(step) => {
                self.session
                    .borrow_mut()
                    .set_bar_message(&format!("Redid {} byte(s).", step.bytes.len()));
                let listeners = self.ext.borrow().redo_listener_snapshot();
                for listener in listeners {
                    listener(step.pos)?;
                }
            }
            None => self.session.borrow_mut().set_bar_message(MSG_NOTHING_TO_REDO),
        }
        Ok(())
    }

    /// Runs save listeners, then commits. A listener failure aborts the
    /// remaining listeners and the save itself.
    pub fn save_file(&mut self) -> Result<(), CycleError> {
        let listeners = self.ext.borrow().save_listener_snapshot();
        for listener in listeners {
            listener()?;
        }
        self.store.borrow_mut().commit()?;
        self.session.borrow_mut().set_bar_message(MSG_SAVED);
        Ok(())
    }

    fn handle_functional_info_asking(&mut self, key: KeyCode) -> Result<(), CycleError> {
        let count = self.ext.borrow().note_count();
        let mut session = self.session.borrow_mut();

        if keys::is_exit_key(key) || keys::is_question_key(key) {
            session.set_mode(Mode::Hex);
        } else if count == 0 {
            // No notes registered; only leaving the menu does anything.
        } else if keys::is_up_key(key) {
            let selected = session.info_selected();
            session.set_info_selected(if selected == 0 { count - 1 } else { selected - 1 });
        } else if keys::is_down_key(key) {
            let selected = (session.info_selected() + 1) % count;
            session.set_info_selected(selected);
        } else if keys::is_enter_key(key) {
            let selected = session.info_selected();
            drop(session);
            let text_fn = self.ext.borrow().note_text_fn(selected);
            if let Some(text_fn) = text_fn {
                let text = text_fn()?;
                let mut session = self.session.borrow_mut();
                session.set_info_text(text.lines().map(str::to_owned).collect());
                session.set_info_row(0);
                session.set_mode(Mode::Info);
            }
        }
        Ok(())
    }

    fn handle_functional_info(&mut self, key: KeyCode) {
        let mut session = self.session.borrow_mut();

        if keys::is_exit_key(key) {
            session.set_mode(Mode::Hex);
        } else if keys::is_question_key(key) {
            session.set_mode(Mode::InfoAsking);
        } else if keys::is_up_key(key) {
            let row = session.info_row().saturating_sub(1);
            session.set_info_row(row);
        } else if keys::is_down_key(key) {
            // Only the top is clamped; scrolling past the last line shows
            // an empty view.
            let row = session.info_row() + 1;
            session.set_info_row(row);
        }
    }

    /// Non-functional built-ins; today that is terminal resize handling.
    fn handle_special(&mut self, key: KeyCode) -> Result<(), CycleError> {
        if key != keys::KEY_RESIZE {
            return Ok(());
        }

        let (width, height) = self.screen.borrow().size();
        self.diag.borrow_mut().debug(format!("resized to {width}x{height}"));
        let (view, bar) = {
            let mut session = self.session.borrow_mut();
            session.viewport_mut().on_resize(width, height);
            (session.view_window(), session.bar_window())
        };
        {
            let session = self.session.borrow();
            let mut screen = self.screen.borrow_mut();
            if let Some(view) = view {
                screen.resize_window(view, session.viewport().main());
            }
            if let Some(bar) = bar {
                screen.resize_window(bar, session.viewport().bar());
            }
        }

        let callbacks = self.ext.borrow().panel_resize_snapshot();
        for (_, callback) in callbacks {
            callback()?;
        }

        self.session.borrow_mut().update_row_position();
        Ok(())
    }

    pub fn draw(&mut self) -> Result<(), CycleError> {
        let mode = self.session.borrow().mode();
        match mode {
            Mode::Default => self.draw_default()?,
            Mode::Hex => self.draw_view()?,
            Mode::InfoAsking => self.draw_info_asking()?,
            Mode::Info => self.draw_info()?,
        }
        self.draw_bar()?;
        self.screen.borrow_mut().refresh()?;
        Ok(())
    }

    fn draw_default(&mut self) -> Result<(), CycleError> {
        let Some(view) = self.session.borrow().view_window() else {
            return Ok(());
        };
        let mut screen = self.screen.borrow_mut();
        screen.erase(view);
        screen.move_to(view, 0, 0);
        screen.print_clipped(view, "hexide");
        Ok(())
    }

    fn draw_bar(&mut self) -> Result<(), CycleError> {
        let session = self.session.borrow();
        let Some(bar) = session.bar_window() else {
            return Ok(());
        };
        let file_end = self.store.borrow().file_end();
        let read_only = self.store.borrow().is_read_only();
        let unsaved = self.store.borrow().has_unsaved_edits();

        let mut status = format!("0x{:08X} / 0x{:08X}", session.selected_pos(), file_end);
        if read_only {
            status.push_str("  [read-only]");
        } else if unsaved {
            status.push_str("  [modified]");
        }
        if session.hex_state() == HexViewState::Editing {
            status.push_str("  EDIT");
        }

        let message = session.bar_message().to_owned();
        drop(session);

        let mut screen = self.screen.borrow_mut();
        screen.erase(bar);
        screen.move_to(bar, 0, 0);
        screen.print_clipped(bar, &message);
        screen.move_to(bar, 0, 1);
        screen.print_clipped(bar, &status);
        Ok(())
    }

    /// Draws the hex view. When a write interceptor is installed it owns
    /// the byte rendering; panel callbacks always run afterwards.
    fn draw_view(&mut self) -> Result<(), CycleError> {
        let (view, row_offset, bpr, rows) = {
            let session = self.session.borrow();
            let Some(view) = session.view_window() else {
                return Ok(());
            };
            (view, session.row_offset(), session.bytes_per_row(), session.visible_rows())
        };
        self.screen.borrow_mut().erase(view);

        let visible = self
            .store
            .borrow_mut()
            .read_range(row_offset, (bpr * rows) as usize);

        let listener = self.ext.borrow().write_listener();
        match listener {
            Some(listener) => listener(&visible, row_offset)?,
            None => self.draw_plain_hex(view, &visible, row_offset, bpr)?,
        }

        let renders = self.ext.borrow().panel_render_snapshot();
        for (_, render) in renders {
            render()?;
        }
        Ok(())
    }

    /// Fallback rendering used when no plugin took over the hex pane.
    fn draw_plain_hex(
        &mut self,
        view: WindowId,
        visible: &[u8],
        row_offset: u64,
        bpr: u64,
    ) -> Result<(), CycleError> {
        if bpr == 0 {
            return Ok(());
        }
        let (sel, hex_x, hex_y) = {
            let session = self.session.borrow();
            (
                session.selected_pos(),
                session.viewport().hex_x(session.panels()),
                session.viewport().hex_y(),
            )
        };

        let mut screen = self.screen.borrow_mut();
        for (i, byte) in visible.iter().enumerate() {
            let offset = row_offset + i as u64;
            let row = (i as u64 / bpr) as u16;
            let col = (i as u64 % bpr) as u16;
            screen.move_to(view, hex_x + col * 3, hex_y + row);
            if offset == sel {
                screen.set_attr(view, TextAttr::Standout, true);
            }
            screen.print_clipped(view, &bytes::byte_to_string_padded(*byte));
            if offset == sel {
                screen.set_attr(view, TextAttr::Standout, false);
            }
        }
        Ok(())
    }

    fn draw_info_asking(&mut self) -> Result<(), CycleError> {
        let (view, selected, height) = {
            let session = self.session.borrow();
            let Some(view) = session.view_window() else {
                return Ok(());
            };
            (view, session.info_selected(), session.viewport().hex_height() as usize)
        };
        let titles = self.ext.borrow().note_titles();

        // Row 0 holds the heading; the list scrolls so the selection stays
        // on screen.
        let visible = height.saturating_sub(1);
        let first = if visible == 0 { 0 } else { selected.saturating_sub(visible - 1) };

        let mut screen = self.screen.borrow_mut();
        screen.erase(view);
        screen.move_to(view, 0, 0);
        screen.print_clipped(view, "Info:");
        for (i, title) in titles.iter().enumerate().skip(first).take(visible) {
            screen.move_to(view, 2, (1 + i - first) as u16);
            if i == selected {
                screen.set_attr(view, TextAttr::Standout, true);
            }
            screen.print_clipped(view, title);
            if i == selected {
                screen.set_attr(view, TextAttr::Standout, false);
            }
        }
        Ok(())
    }

    fn draw_info(&mut self) -> Result<(), CycleError> {
        let session = self.session.borrow();
        let Some(view) = session.view_window() else {
            return Ok(());
        };
        let height = session.viewport().hex_height() as usize;
        let first = session.info_row();
        let lines: Vec<String> = session
            .info_text()
            .iter()
            .skip(first)
            .take(height)
            .cloned()
            .collect();
        drop(session);

        let mut screen = self.screen.borrow_mut();
        screen.erase(view);
        for (i, line) in lines.iter().enumerate() {
            screen.move_to(view, 0, i as u16);
            screen.print_clipped(view, line);
        }
        Ok(())
    }
}
