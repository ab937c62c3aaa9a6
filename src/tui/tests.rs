// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

use std::cell::{Cell, RefCell};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::rstest;

use super::Editor;
use crate::diag::DiagnosticLog;
use crate::ext::{Extensions, SharedExtensions};
use crate::keys::{self, KeyCode};
use crate::session::{
    CallbackError, HexViewState, Mode, NibblePos, Prompt, SessionState, SharedSession,
};
use crate::store::{FileBuffer, SharedStore, DEFAULT_CHUNK_SIZE};
use crate::term::RecordingScreen;

static TEMP_FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn with_contents(prefix: &str, contents: &[u8]) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("hexide-{prefix}-{}-{nanos}-{counter}.bin", std::process::id()));
        fs::write(&path, contents).unwrap();
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

struct Harness {
    editor: Editor,
    session: SharedSession,
    store: SharedStore,
    ext: SharedExtensions,
    screen: Rc<RefCell<RecordingScreen>>,
    _file: TempFile,
}

/// 64x6 terminal over a fresh copy of `contents`.
fn harness(contents: &[u8], read_only: bool) -> Harness {
    let file = TempFile::with_contents("tui", contents);
    let store = FileBuffer::open(file.path(), read_only, (0, None), DEFAULT_CHUNK_SIZE)
        .unwrap()
        .shared();
    let session = SessionState::shared(64, 6, PathBuf::from("/dev/null"));
    let ext = Extensions::shared();
    let screen = Rc::new(RefCell::new(RecordingScreen::new(64, 6)));
    let diag = DiagnosticLog::shared(false);

    let mut editor = Editor::new(
        session.clone(),
        store.clone(),
        ext.clone(),
        screen.clone(),
        diag,
    );
    editor.handle_init().unwrap();

    Harness { editor, session, store, ext, screen, _file: file }
}

fn press(h: &mut Harness, key: KeyCode) {
    h.editor.handle_event(key).unwrap();
}

#[rstest]
fn sessions_open_straight_into_the_hex_view() {
    let h = harness(&[0x00; 16], false);
    assert_eq!(h.session.borrow().mode(), Mode::Hex);
}

#[rstest]
fn default_mode_only_honors_the_exit_key() {
    let mut h = harness(&[0x00; 16], false);
    h.session.borrow_mut().set_mode(Mode::Default);

    press(&mut h, 'x' as KeyCode);
    press(&mut h, '\n' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::Default);
    assert!(!h.session.borrow().should_exit());

    press(&mut h, 'q' as KeyCode);
    assert!(h.session.borrow().should_exit());
}

#[rstest]
fn init_listeners_run_exactly_once() {
    let file = TempFile::with_contents("tui", &[0u8; 4]);
    let store = FileBuffer::open(file.path(), false, (0, None), DEFAULT_CHUNK_SIZE)
        .unwrap()
        .shared();
    let session = SessionState::shared(64, 6, PathBuf::from("/dev/null"));
    let ext = Extensions::shared();
    let screen = Rc::new(RefCell::new(RecordingScreen::new(64, 6)));

    let calls = Rc::new(Cell::new(0));
    let witness = calls.clone();
    ext.borrow_mut().listen_for_init(Rc::new(move || {
        witness.set(witness.get() + 1);
        Ok(())
    }));

    let mut editor =
        Editor::new(session, store, ext, screen, DiagnosticLog::shared(false));
    editor.handle_init().unwrap();
    editor.handle_event('x' as KeyCode).unwrap();
    editor.handle_event('j' as KeyCode).unwrap();
    assert_eq!(calls.get(), 1);
}

#[rstest]
fn nibble_editing_rewrites_half_a_byte_at_a_time() {
    let mut h = harness(&[0x3f, 0x00, 0x00, 0x00], false);
    press(&mut h, '\n' as KeyCode);
    assert_eq!(h.session.borrow().hex_state(), HexViewState::Editing);

    press(&mut h, 'a' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0xaf));
    assert_eq!(h.session.borrow().nibble(), NibblePos::Low);
    assert_eq!(h.session.borrow().selected_pos(), 0);

    press(&mut h, '0' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0xa0));
    assert_eq!(h.session.borrow().nibble(), NibblePos::High);
    // Finishing a byte moves on while edit-move-forward is set.
    assert_eq!(h.session.borrow().selected_pos(), 1);
}

#[rstest]
fn finishing_a_byte_stays_put_when_move_forward_is_off() {
    let mut h = harness(&[0x00; 4], false);
    h.session.borrow_mut().set_edit_move_forward(false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, '1' as KeyCode);
    press(&mut h, '2' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x12));
    assert_eq!(h.session.borrow().selected_pos(), 0);
}

#[rstest]
fn editing_in_read_only_mode_is_refused() {
    let mut h = harness(&[0x55; 4], true);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, 'f' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x55));
    assert_eq!(h.session.borrow().bar_message(), "Cannot edit in read only mode.");
}

#[rstest]
fn save_preconditions_are_reported_in_the_bar() {
    let mut h = harness(&[0x00; 4], true);
    press(&mut h, keys::CTRL_S);
    assert_eq!(h.session.borrow().bar_message(), "Cannot save in read only mode.");

    let mut h = harness(&[0x00; 4], false);
    press(&mut h, keys::CTRL_S);
    assert_eq!(h.session.borrow().bar_message(), "No changes to save.");
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
}

#[rstest]
fn save_prompt_commits_on_yes() {
    let mut h = harness(&[0x00; 4], false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, 'a' as KeyCode);
    press(&mut h, 'b' as KeyCode);
    press(&mut h, '\n' as KeyCode);

    press(&mut h, keys::CTRL_S);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmSave);

    press(&mut h, 'y' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
    assert!(!h.store.borrow().has_unsaved_edits());
    assert_eq!(fs::read(h._file.path()).unwrap()[0], 0xab);
    assert_eq!(h.session.borrow().bar_message(), "Saved.");
}

#[rstest]
fn a_failing_save_listener_aborts_the_save() {
    let mut h = harness(&[0x00; 4], false);
    h.ext
        .borrow_mut()
        .listen_for_save(Rc::new(|| Err(CallbackError::new("save listener", "refused"))));

    press(&mut h, '\n' as KeyCode);
    press(&mut h, '1' as KeyCode);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, keys::CTRL_S);

    assert!(h.editor.handle_event('y' as KeyCode).is_err());
    assert!(h.store.borrow().has_unsaved_edits());
    assert_eq!(fs::read(h._file.path()).unwrap()[0], 0x00);
}

#[rstest]
fn a_prompt_swallows_hex_digits_without_editing() {
    let mut h = harness(&[0x00; 4], false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, 'a' as KeyCode);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, keys::CTRL_S);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmSave);

    // 'f' is a hex digit, but here it only dismisses the question.
    press(&mut h, 'f' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
    assert_eq!(h.store.borrow_mut().read(0), Some(0xa0));
    assert!(h.store.borrow().has_unsaved_edits());
}

#[rstest]
fn prompts_survive_non_printable_keys() {
    let mut h = harness(&[0x00; 4], false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, '1' as KeyCode);
    press(&mut h, '\n' as KeyCode);

    press(&mut h, keys::CTRL_S);
    press(&mut h, keys::KEY_UP);
    press(&mut h, keys::KEY_PAGE_DOWN);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmSave);
    press(&mut h, 'n' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
    assert!(h.store.borrow().has_unsaved_edits());

    press(&mut h, 'q' as KeyCode);
    press(&mut h, keys::KEY_UP);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmExit);
    // Enter dismisses the exit question without confirming it.
    press(&mut h, '\n' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
    assert!(!h.session.borrow().should_exit());
}

#[rstest]
fn the_editing_submode_keeps_save_undo_redo_and_exit() {
    let mut h = harness(&[0x3f, 0x00, 0x00, 0x00], false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, '1' as KeyCode);
    press(&mut h, '2' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x12));

    press(&mut h, 'u' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x1f));
    assert_eq!(h.session.borrow().hex_state(), HexViewState::Editing);
    press(&mut h, 'r' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x12));

    press(&mut h, keys::CTRL_S);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmSave);
    press(&mut h, 'n' as KeyCode);

    press(&mut h, '?' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::InfoAsking);
    press(&mut h, 'q' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::Hex);
    assert_eq!(h.session.borrow().hex_state(), HexViewState::Editing);

    press(&mut h, 'q' as KeyCode);
    assert_eq!(h.session.borrow().hex_state(), HexViewState::Default);
    assert_eq!(h.session.borrow().nibble(), NibblePos::High);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
}

#[rstest]
fn exiting_with_unsaved_changes_asks_first() {
    let mut h = harness(&[0x00; 4], false);
    press(&mut h, '\n' as KeyCode);
    press(&mut h, '1' as KeyCode);
    press(&mut h, '\n' as KeyCode);

    press(&mut h, 'q' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmExit);
    assert!(!h.session.borrow().should_exit());

    press(&mut h, 'n' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::None);
    assert!(!h.session.borrow().should_exit());

    press(&mut h, 'q' as KeyCode);
    press(&mut h, 'y' as KeyCode);
    assert!(h.session.borrow().should_exit());
}

#[rstest]
fn the_exit_key_always_asks_first() {
    let mut h = harness(&[0x00; 4], false);
    press(&mut h, 'q' as KeyCode);
    assert_eq!(h.session.borrow().prompt(), Prompt::ConfirmExit);
    assert!(!h.session.borrow().should_exit());

    press(&mut h, 'y' as KeyCode);
    assert!(h.session.borrow().should_exit());
}

#[rstest]
fn undo_and_redo_report_through_the_bar_and_listeners() {
    let mut h = harness(&[0x00; 4], false);
    let undone_at = Rc::new(Cell::new(u64::MAX));
    let witness = undone_at.clone();
    h.ext.borrow_mut().listen_for_undo(Rc::new(move |pos| {
        witness.set(pos);
        Ok(())
    }));

    press(&mut h, '\n' as KeyCode);
    press(&mut h, '7' as KeyCode);
    press(&mut h, '\n' as KeyCode);

    press(&mut h, 'u' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x00));
    assert_eq!(undone_at.get(), 0);
    assert_eq!(h.session.borrow().bar_message(), "Undid 1 byte(s).");

    press(&mut h, 'r' as KeyCode);
    assert_eq!(h.store.borrow_mut().read(0), Some(0x70));
    assert_eq!(h.session.borrow().bar_message(), "Redid 1 byte(s).");

    press(&mut h, 'r' as KeyCode);
    assert_eq!(h.session.borrow().bar_message(), "Could not redo.");
}

#[rstest]
fn a_stopping_key_handler_suppresses_built_ins() {
    let mut h = harness(&[0x00; 64], false);
    h.ext.borrow_mut().register_key_handler(Rc::new(|_| {
        Ok(crate::session::HandlerVerdict::from_mask(2))
    }));

    h.screen.borrow_mut().take_ops();
    press(&mut h, 'j' as KeyCode);
    // Functional ran (cursor moved) but drawing was vetoed.
    assert_eq!(h.session.borrow().selected_pos(), 16);
    let ops = h.screen.borrow_mut().take_ops();
    assert!(!ops.iter().any(|op| matches!(op, crate::term::RecordedOp::Refresh)));
}

#[rstest]
fn write_listener_takes_over_byte_rendering() {
    let mut h = harness(&[0xde, 0xad, 0xbe, 0xef], false);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let witness = seen.clone();
    h.ext.borrow_mut().listen_for_write(Rc::new(move |bytes, offset| {
        witness.borrow_mut().push((bytes.to_vec(), offset));
        Ok(())
    }));

    press(&mut h, 'l' as KeyCode);
    let calls = seen.borrow();
    let (bytes, offset) = calls.last().unwrap();
    assert_eq!(offset, &0);
    assert_eq!(bytes, &vec![0xde, 0xad, 0xbe, 0xef]);
}

#[rstest]
fn info_menu_wraps_and_opens_notes() {
    let mut h = harness(&[0x00; 4], false);
    h.ext.borrow_mut().register_note("first", Rc::new(|| Ok(String::from("one\ntwo"))));
    h.ext.borrow_mut().register_note("second", Rc::new(|| Ok(String::from("other"))));

    press(&mut h, '?' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::InfoAsking);
    assert_eq!(h.session.borrow().info_selected(), 0);

    press(&mut h, 'k' as KeyCode);
    assert_eq!(h.session.borrow().info_selected(), 1);
    press(&mut h, 'j' as KeyCode);
    assert_eq!(h.session.borrow().info_selected(), 0);

    press(&mut h, '\n' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::Info);
    assert_eq!(h.session.borrow().info_text(), ["one", "two"]);

    // Scrolling clamps at the top only.
    press(&mut h, 'k' as KeyCode);
    assert_eq!(h.session.borrow().info_row(), 0);
    press(&mut h, 'j' as KeyCode);
    press(&mut h, 'j' as KeyCode);
    press(&mut h, 'j' as KeyCode);
    assert_eq!(h.session.borrow().info_row(), 3);

    press(&mut h, 'q' as KeyCode);
    assert_eq!(h.session.borrow().mode(), Mode::Hex);
}

#[rstest]
fn the_note_menu_scrolls_to_keep_the_selection_visible() {
    let mut h = harness(&[0x00; 4], false);
    for i in 0..6 {
        let title = format!("note{i}");
        h.ext.borrow_mut().register_note(&title, Rc::new(|| Ok(String::new())));
    }

    press(&mut h, '?' as KeyCode);
    press(&mut h, 'j' as KeyCode);
    press(&mut h, 'j' as KeyCode);
    press(&mut h, 'j' as KeyCode);
    h.screen.borrow_mut().take_ops();

    // Selecting the fifth note on a 3-row list scrolls notes 0 and 1 off.
    press(&mut h, 'j' as KeyCode);
    let printed = {
        let screen = h.screen.borrow();
        let view = h.session.borrow().view_window().unwrap();
        screen.printed_text(view)
    };
    assert!(printed.contains("note2"));
    assert!(printed.contains("note4"));
    assert!(!printed.contains("note0"));
    assert!(!printed.contains("note1"));
}

#[rstest]
fn resize_reanchors_the_view_and_runs_panel_callbacks() {
    let mut h = harness(&[0x00; 256], false);
    let resized = Rc::new(Cell::new(false));
    let witness = resized.clone();
    let panel = h
        .session
        .borrow_mut()
        .panels_mut()
        .create(crate::layout::PanelSide::Left);
    h.ext.borrow_mut().set_panel_resize(
        panel,
        Rc::new(move || {
            witness.set(true);
            Ok(())
        }),
    );

    h.screen.borrow_mut().set_size(32, 10);
    press(&mut h, keys::KEY_RESIZE);
    assert!(resized.get());
    assert_eq!(h.session.borrow().bytes_per_row(), 8);
}

#[rstest]
fn run_loop_stops_on_exit_key() {
    let mut h = harness(&[0x00; 4], false);
    h.screen
        .borrow_mut()
        .script_keys(['j' as KeyCode, 'q' as KeyCode, 'y' as KeyCode]);
    // handle_init was already run by the harness; run() repeats it, which
    // only redraws.
    h.editor.run().unwrap();
    assert!(h.session.borrow().should_exit());
}
