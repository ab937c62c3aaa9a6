// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::rstest;

use super::{read_config, ScriptHost};
use crate::diag::DiagnosticLog;
use crate::ext::{Extensions, SharedExtensions};
use crate::keys::KeyCode;
use crate::session::{dispatch, SessionState, SharedSession};
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
        path.push(format!("hexide-{prefix}-{}-{nanos}-{counter}", std::process::id()));
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
    host: ScriptHost,
    session: SharedSession,
    store: SharedStore,
    ext: SharedExtensions,
    _file: TempFile,
}

fn harness(contents: &[u8]) -> Harness {
    let file = TempFile::with_contents("script", contents);
    let store = FileBuffer::open(file.path(), false, (0, None), DEFAULT_CHUNK_SIZE)
        .unwrap()
        .shared();
    let session = SessionState::shared(64, 6, PathBuf::from("/dev/null"));
    let ext = Extensions::shared();
    let screen = Rc::new(RefCell::new(RecordingScreen::new(64, 6)));
    let host = ScriptHost::new(
        session.clone(),
        store.clone(),
        ext.clone(),
        screen,
        DiagnosticLog::shared(false),
        Path::new("/tmp/plugins"),
    )
    .unwrap();
    Harness { host, session, store, ext, _file: file }
}

#[rstest]
fn config_values_are_read_from_the_config_file() {
    let config = TempFile::with_contents(
        "config",
        br#"
plugins = { PLUGIN_DIR .. "/One.lua", "/abs/Two.lua" }
max_chunk_memory = 4096
max_chunk_size = 128
"#,
    );
    let values = read_config(config.path(), Path::new("/opt/hexide/plugins")).unwrap();
    assert_eq!(
        values.plugins,
        vec![
            PathBuf::from("/opt/hexide/plugins/One.lua"),
            PathBuf::from("/abs/Two.lua")
        ]
    );
    assert_eq!(values.max_chunk_memory, Some(4096));
    assert_eq!(values.max_chunk_size, Some(128));
}

#[rstest]
fn missing_config_falls_back_to_the_bundled_plugins() {
    let values =
        read_config(Path::new("/nonexistent/hexide.lua"), Path::new("/pd")).unwrap();
    assert_eq!(
        values.plugins,
        vec![
            PathBuf::from("/pd/Offsets.lua"),
            PathBuf::from("/pd/HexWrite.lua"),
            PathBuf::from("/pd/AsciiView.lua")
        ]
    );
    assert_eq!(values.max_chunk_memory, None);
}

#[rstest]
fn session_state_is_reachable_from_lua() {
    let h = harness(&[0u8; 32]);
    h.host
        .exec("setSelectedPosition(5) setBarMessage('from lua')")
        .unwrap();
    assert_eq!(h.session.borrow().selected_pos(), 5);
    assert_eq!(h.session.borrow().bar_message(), "from lua");

    h.host.exec("assert(getSelectedPosition() == 5)").unwrap();
    h.host.exec("assert(getFileEnd() == 32)").unwrap();
    h.host.exec("assert(getBytesPerRow() == 16)").unwrap();
}

#[rstest]
fn bytes_round_trip_through_lua() {
    let h = harness(&[0x10, 0x20, 0x30]);
    h.host.exec("assert(readByte(1) == 0x20)").unwrap();
    h.host.exec("assert(readByte(3) == nil)").unwrap();
    h.host.exec("assert(hasByte(2) and not hasByte(3))").unwrap();

    h.host.exec("editByte(0, 0xff)").unwrap();
    assert_eq!(h.store.borrow_mut().read(0), Some(0xff));
    h.host
        .exec("local b = readBytes(0, 3) assert(#b == 3 and b[1] == 0xff and b[3] == 0x30)")
        .unwrap();

    h.host.exec("assert(undoEdit())").unwrap();
    assert_eq!(h.store.borrow_mut().read(0), Some(0x10));
    h.host.exec("assert(redoEdit())").unwrap();
    h.host.exec("assert(not redoEdit())").unwrap();
}

#[rstest]
fn lua_key_handlers_join_the_dispatch_chain() {
    let h = harness(&[0u8; 4]);
    h.host
        .exec(
            r#"
handled = registerKeyHandler(function(key)
    if key == string.byte('x') then
        return KeyHandled.FULL_STOP
    end
end)
"#,
        )
        .unwrap();
    assert_eq!(h.ext.borrow().key_handler_snapshot().len(), 1);

    let handlers = h.ext.borrow().key_handler_snapshot();
    let permissions = dispatch::run_chain(&handlers, 'x' as KeyCode).unwrap();
    assert!(!permissions.functional);
    assert!(!permissions.drawing);

    let permissions = dispatch::run_chain(&handlers, 'y' as KeyCode).unwrap();
    assert!(permissions.functional);

    h.host.exec("removeKeyHandler(handled)").unwrap();
    assert!(h.ext.borrow().key_handler_snapshot().is_empty());
}

#[rstest]
fn info_notes_register_and_render_from_lua() {
    let h = harness(&[0u8; 4]);
    h.host
        .exec("registerInfo('stats', function() return 'size ' .. getFileEnd() end)")
        .unwrap();
    assert_eq!(h.ext.borrow().note_titles(), vec!["stats"]);
    let text = h.ext.borrow().note_text_fn(0).unwrap()().unwrap();
    assert_eq!(text, "size 4");

    h.host.exec("deregisterInfo('stats')").unwrap();
    assert_eq!(h.ext.borrow().note_count(), 0);
}

#[rstest]
fn write_listener_receives_bytes_as_a_table() {
    let h = harness(&[0u8; 4]);
    h.host
        .exec(
            r#"
listenForWrite(function(data, offset)
    seen_count = #data
    seen_offset = offset
    seen_first = data[1]
end)
"#,
        )
        .unwrap();
    assert!(h.ext.borrow().has_write_listener());

    let listener = h.ext.borrow().write_listener().unwrap();
    listener(&[0xaa, 0xbb], 3).unwrap();
    h.host
        .exec("assert(seen_count == 2 and seen_offset == 3 and seen_first == 0xaa)")
        .unwrap();
}

#[rstest]
fn subviews_shape_the_layout_from_lua() {
    let h = harness(&[0u8; 64]);
    h.host
        .exec(
            r#"
gutter = createSubView(ViewLocation.LEFT)
gutter:setWidth(8)
gutter:setX(0)
gutter:setY(0)
assert(gutter:isVisible())
"#,
        )
        .unwrap();
    // 64 wide minus the 8-column gutter leaves 14 bytes per row.
    assert_eq!(h.session.borrow().bytes_per_row(), 14);
    h.host.exec("assert(getBytesPerRow() == 14)").unwrap();

    h.host
        .exec("local again = getSubView(gutter:getID()) assert(again:getWidth() == 8)")
        .unwrap();
    h.host.exec("assert(getSubView(99) == nil)").unwrap();
}

#[rstest]
fn broken_plugins_are_logged_and_skipped() {
    let good = TempFile::with_contents("plugin-good", b"loaded_ok = true");
    let bad = TempFile::with_contents("plugin-bad", b"this is not lua (");

    let file = TempFile::with_contents("script", &[0u8; 4]);
    let store = FileBuffer::open(file.path(), false, (0, None), DEFAULT_CHUNK_SIZE)
        .unwrap()
        .shared();
    let diag = DiagnosticLog::shared(false);
    let host = ScriptHost::new(
        SessionState::shared(64, 6, PathBuf::from("/dev/null")),
        store,
        Extensions::shared(),
        Rc::new(RefCell::new(RecordingScreen::new(64, 6))),
        diag.clone(),
        Path::new("/tmp/plugins"),
    )
    .unwrap();

    host.load_plugins(&[bad.path().to_path_buf(), good.path().to_path_buf()]);
    host.exec("assert(loaded_ok)").unwrap();
    assert_eq!(diag.borrow().entries().len(), 1);
    assert!(diag.borrow().entries()[0].contains("failed to load"));
}

#[rstest]
fn mask_constants_match_the_dispatch_protocol() {
    let h = harness(&[0u8; 4]);
    h.host
        .exec(
            r#"
assert(KeyHandled.ALL == 15)
assert(KeyHandled.HANDLER + KeyHandled.FUNCTIONAL + KeyHandled.SPECIAL + KeyHandled.DRAWING == KeyHandled.ALL)
assert(MColors.DEFAULT == 0)
assert(MColors.BLACK_BLACK == 1)
assert(MColors.WHITE_WHITE == 64)
assert(ViewLocation.RIGHT == 1 and ViewLocation.LEFT == 2)
assert(UIState.HEX == 1 and UIState.INFO == 3)
assert(UIBarAsking.NONE == 0 and UIBarAsking.SAVE == 2)
assert(getUIState() == UIState.HEX)
assert(getUIBarAsking() == UIBarAsking.NONE)
setUIState(UIState.DEFAULT)
assert(getUIState() == UIState.DEFAULT)
setUIState(UIState.HEX)
"#,
        )
        .unwrap();
}
