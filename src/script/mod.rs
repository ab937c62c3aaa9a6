// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Lua scripting host.
//!
//! Guest code sees the editor through a flat, camelCase function API plus a
//! `SubView` userdata for panels. Configuration runs in two stages: a bare
//! interpreter reads the config file before the file buffer exists (the
//! config decides chunk limits), then the full API is installed and plugins
//! load.
//!
//! Every binding captures `Rc` handles to the shared state. No `RefCell`
//! borrow is held across a call back into Lua.

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::{Function, Lua, Table, UserData, UserDataMethods, Value, Variadic};

use crate::bytes;
use crate::diag::SharedDiag;
use crate::ext::SharedExtensions;
use crate::keys::{self, KeyCode};
use crate::layout::{PanelId, PanelSide};
use crate::session::{
    CallbackError, HandlerVerdict, HexViewState, Mode, NibblePos, Prompt, SharedSession,
};
use crate::store::SharedStore;
use crate::term::{SharedScreen, TextAttr, WindowId};

const COLOR_NAMES: [&str; 8] =
    ["BLACK", "RED", "GREEN", "YELLOW", "BLUE", "MAGENTA", "CYAN", "WHITE"];

/// Config consulted before the file buffer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigValues {
    pub plugins: Vec<PathBuf>,
    pub max_chunk_memory: Option<u64>,
    pub max_chunk_size: Option<u64>,
}

impl ConfigValues {
    /// What a fresh install gets: the three bundled plugins, default
    /// limits.
    pub fn bundled(plugin_dir: &Path) -> Self {
        Self {
            plugins: vec![
                plugin_dir.join("Offsets.lua"),
                plugin_dir.join("HexWrite.lua"),
                plugin_dir.join("AsciiView.lua"),
            ],
            max_chunk_memory: None,
            max_chunk_size: None,
        }
    }
}

#[derive(Debug)]
pub enum ScriptError {
    Lua(mlua::Error),
    Io(io::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lua(err) => write!(f, "lua error: {err}"),
            Self::Io(err) => write!(f, "script i/o failed: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lua(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<mlua::Error> for ScriptError {
    fn from(err: mlua::Error) -> Self {
        Self::Lua(err)
    }
}

impl From<io::Error> for ScriptError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Shipped when the user has no config file.
const DEFAULT_CONFIG: &str = r#"
plugins = {
    PLUGIN_DIR .. "/Offsets.lua",
    PLUGIN_DIR .. "/HexWrite.lua",
    PLUGIN_DIR .. "/AsciiView.lua",
}
"#;

/// Stage one: evaluates the config file with only `PLUGIN_DIR` and
/// `getConfigPath` available, and collects the values the rest of startup
/// needs. A missing config file falls back to the bundled default.
pub fn read_config(config_path: &Path, plugin_dir: &Path) -> Result<ConfigValues, ScriptError> {
    let lua = Lua::new();
    let globals = lua.globals();
    globals.set("PLUGIN_DIR", plugin_dir.to_string_lossy().into_owned())?;
    let reported = config_path.to_string_lossy().into_owned();
    globals.set(
        "getConfigPath",
        lua.create_function(move |_, ()| Ok(reported.clone()))?,
    )?;

    let source = match fs::read_to_string(config_path) {
        Ok(source) => source,
        Err(err) if err.kind() == io::ErrorKind::NotFound => DEFAULT_CONFIG.to_owned(),
        Err(err) => return Err(err.into()),
    };
    lua.load(&source)
        .set_name(config_path.to_string_lossy().into_owned())
        .exec()?;

    let mut values = ConfigValues::default();
    if let Ok(list) = globals.get::<Table>("plugins") {
        for entry in list.sequence_values::<String>() {
            values.plugins.push(PathBuf::from(entry?));
        }
    }
    values.max_chunk_memory = globals.get::<Option<u64>>("max_chunk_memory")?;
    values.max_chunk_size = globals.get::<Option<u64>>("max_chunk_size")?;
    Ok(values)
}

fn callback_error(context: &'static str, err: mlua::Error) -> CallbackError {
    CallbackError::new(context, err.to_string())
}

/// Interprets a key handler's return value. `nil` means no opinion; an
/// integer is a `KeyHandled` bitmask.
fn verdict_from_value(value: Value) -> HandlerVerdict {
    match value {
        Value::Integer(mask) => HandlerVerdict::from_mask(mask),
        Value::Number(mask) => HandlerVerdict::from_mask(mask as i64),
        _ => HandlerVerdict::NoOpinion,
    }
}

/// One panel as guest code sees it.
#[derive(Clone)]
struct SubViewHandle {
    id: PanelId,
    session: SharedSession,
    ext: SharedExtensions,
    screen: SharedScreen,
}

impl SubViewHandle {
    fn view_window(&self) -> Option<WindowId> {
        self.session.borrow().view_window()
    }

    /// Absolute cursor position for panel-relative coordinates. Right-side
    /// panels start past the hex pane; negatives clamp to the view origin.
    fn absolute(&self, to_y: i64, to_x: i64) -> (u16, u16) {
        let session = self.session.borrow();
        let (panel_x, panel_y, side) = match session.panels().get(self.id) {
            Some(panel) => (
                i64::from(panel.x.max(0)),
                i64::from(panel.y.max(0)),
                panel.side,
            ),
            None => (0, 0, PanelSide::None),
        };
        let viewport = session.viewport();
        let mut x = panel_x + to_x;
        if side == PanelSide::Right {
            x += i64::from(viewport.hex_x(session.panels()))
                + i64::from(viewport.hex_width(session.panels()));
        }
        let y = i64::from(viewport.hex_y()) + panel_y + to_y;
        (x.max(0) as u16, y.max(0) as u16)
    }
}

impl UserData for SubViewHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("getID", |_, this, ()| Ok(this.id.raw()));

        methods.add_method("setWidth", |_, this, width: i32| {
            let mut session = this.session.borrow_mut();
            if let Some(panel) = session.panels_mut().get_mut(this.id) {
                panel.width = width;
            }
            Ok(())
        });
        methods.add_method("getWidth", |_, this, ()| {
            let session = this.session.borrow();
            Ok(session.panels().get(this.id).map_or(-1, |p| p.width))
        });
        methods.add_method("setHeight", |_, this, height: i32| {
            let mut session = this.session.borrow_mut();
            if let Some(panel) = session.panels_mut().get_mut(this.id) {
                panel.height = height;
            }
            Ok(())
        });
        methods.add_method("getHeight", |_, this, ()| {
            let session = this.session.borrow();
            Ok(session.panels().get(this.id).map_or(-1, |p| p.height))
        });
        methods.add_method("setX", |_, this, x: i32| {
            let mut session = this.session.borrow_mut();
            if let Some(panel) = session.panels_mut().get_mut(this.id) {
                panel.x = x;
            }
            Ok(())
        });
        methods.add_method("setY", |_, this, y: i32| {
            let mut session = this.session.borrow_mut();
            if let Some(panel) = session.panels_mut().get_mut(this.id) {
                panel.y = y;
            }
            Ok(())
        });
        methods.add_method("setVisible", |_, this, visible: bool| {
            let mut session = this.session.borrow_mut();
            if let Some(panel) = session.panels_mut().get_mut(this.id) {
                panel.visible = visible;
            }
            Ok(())
        });
        methods.add_method("isVisible", |_, this, ()| {
            let session = this.session.borrow();
            Ok(session.panels().get(this.id).is_some_and(|p| p.visible))
        });

        methods.add_method("onRender", |_, this, callback: Function| {
            this.ext.borrow_mut().set_panel_render(
                this.id,
                Rc::new(move || {
                    callback
                        .call::<()>(())
                        .map_err(|err| callback_error("panel render callback", err))
                }),
            );
            Ok(())
        });
        methods.add_method("clearOnRender", |_, this, ()| {
            this.ext.borrow_mut().clear_panel_render(this.id);
            Ok(())
        });
        methods.add_method("onResize", |_, this, callback: Function| {
            this.ext.borrow_mut().set_panel_resize(
                this.id,
                Rc::new(move || {
                    callback
                        .call::<()>(())
                        .map_err(|err| callback_error("panel resize callback", err))
                }),
            );
            Ok(())
        });
        methods.add_method("clearOnResize", |_, this, ()| {
            this.ext.borrow_mut().clear_panel_resize(this.id);
            Ok(())
        });

        methods.add_method("move", |_, this, (to_y, to_x): (i64, i64)| {
            if let Some(view) = this.view_window() {
                let (x, y) = this.absolute(to_y, to_x);
                this.screen.borrow_mut().move_to(view, x, y);
            }
            Ok(())
        });
        methods.add_method("print", |_, this, text: String| {
            if let Some(view) = this.view_window() {
                this.screen.borrow_mut().print(view, &text);
            }
            Ok(())
        });
        methods.add_method("printStandout", |_, this, text: String| {
            if let Some(view) = this.view_window() {
                let mut screen = this.screen.borrow_mut();
                screen.set_attr(view, TextAttr::Standout, true);
                screen.print(view, &text);
                screen.set_attr(view, TextAttr::Standout, false);
            }
            Ok(())
        });
    }
}

pub struct ScriptHost {
    lua: Lua,
    diag: SharedDiag,
}

impl ScriptHost {
    /// Builds the interpreter and installs the full API.
    pub fn new(
        session: SharedSession,
        store: SharedStore,
        ext: SharedExtensions,
        screen: SharedScreen,
        diag: SharedDiag,
        plugin_dir: &Path,
    ) -> Result<Self, ScriptError> {
        let lua = Lua::new();
        install_constants(&lua, plugin_dir)?;
        install_session_api(&lua, &session, &store)?;
        install_store_api(&lua, &store, &ext)?;
        install_handler_api(&lua, &ext)?;
        install_view_api(&lua, &session, &screen, &ext)?;
        install_plugin_api(&lua, &diag)?;
        Ok(Self { lua, diag })
    }

    /// Loads each plugin, tolerating individual failures: a broken plugin
    /// is logged and skipped.
    pub fn load_plugins(&self, plugins: &[PathBuf]) {
        for path in plugins {
            if let Err(err) = self.load_file(path) {
                self.diag
                    .borrow_mut()
                    .push(format!("plugin {} failed to load: {err}", path.display()));
            }
        }
    }

    fn load_file(&self, path: &Path) -> Result<(), ScriptError> {
        let source = fs::read_to_string(path)?;
        self.lua
            .load(&source)
            .set_name(path.to_string_lossy().into_owned())
            .exec()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn exec(&self, source: &str) -> Result<(), ScriptError> {
        self.lua.load(source).exec()?;
        Ok(())
    }
}

fn install_constants(lua: &Lua, plugin_dir: &Path) -> Result<(), ScriptError> {
    let globals = lua.globals();
    globals.set("PLUGIN_DIR", plugin_dir.to_string_lossy().into_owned())?;

    let view_location = lua.create_table()?;
    view_location.set("NONE", 0)?;
    view_location.set("RIGHT", 1)?;
    view_location.set("LEFT", 2)?;
    view_location.set("TOP", 3)?;
    view_location.set("BOTTOM", 4)?;
    globals.set("ViewLocation", view_location)?;

    let hex_view_state = lua.create_table()?;
    hex_view_state.set("DEFAULT", 0)?;
    hex_view_state.set("EDITING", 1)?;
    globals.set("HexViewState", hex_view_state)?;

    let ui_state = lua.create_table()?;
    ui_state.set("DEFAULT", 0)?;
    ui_state.set("HEX", 1)?;
    ui_state.set("INFO_ASKING", 2)?;
    ui_state.set("INFO", 3)?;
    globals.set("UIState", ui_state)?;

    let ui_bar_asking = lua.create_table()?;
    ui_bar_asking.set("NONE", 0)?;
    ui_bar_asking.set("EXIT", 1)?;
    ui_bar_asking.set("SAVE", 2)?;
    globals.set("UIBarAsking", ui_bar_asking)?;

    let key_handled = lua.create_table()?;
    key_handled.set("FULL_STOP", 0)?;
    key_handled.set("HANDLER", 1)?;
    key_handled.set("FUNCTIONAL", 2)?;
    key_handled.set("SPECIAL", 4)?;
    key_handled.set("DRAWING", 8)?;
    key_handled.set("ALL", 15)?;
    globals.set("KeyHandled", key_handled)?;

    let attributes = lua.create_table()?;
    attributes.set("STANDOUT", 0)?;
    attributes.set("UNDERLINE", 1)?;
    attributes.set("REVERSE", 2)?;
    attributes.set("BLINK", 3)?;
    attributes.set("DIM", 4)?;
    attributes.set("BOLD", 5)?;
    globals.set("DrawingAttributes", attributes)?;

    // Pair ids follow fg*8 + bg + 1, so (id-1)/8 and (id-1)%8 recover the
    // base colors.
    let colors = lua.create_table()?;
    colors.set("DEFAULT", 0)?;
    for (fg, fg_name) in COLOR_NAMES.iter().enumerate() {
        for (bg, bg_name) in COLOR_NAMES.iter().enumerate() {
            colors.set(format!("{fg_name}_{bg_name}"), (fg * 8 + bg + 1) as i64)?;
        }
    }
    globals.set("MColors", colors)?;

    Ok(())
}

fn install_session_api(
    lua: &Lua,
    session: &SharedSession,
    store: &SharedStore,
) -> Result<(), ScriptError> {
    let globals = lua.globals();

    let s = session.clone();
    globals.set(
        "getSelectedPosition",
        lua.create_function(move |_, ()| Ok(s.borrow().selected_pos()))?,
    )?;
    let s = session.clone();
    globals.set(
        "setSelectedPosition",
        lua.create_function(move |_, pos: u64| {
            s.borrow_mut().set_selected_pos(pos);
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getSelectedRow",
        lua.create_function(move |_, ()| Ok(s.borrow().selected_row()))?,
    )?;
    let s = session.clone();
    globals.set(
        "getRowPosition",
        lua.create_function(move |_, ()| Ok(s.borrow().row_pos()))?,
    )?;
    let s = session.clone();
    globals.set(
        "setRowPosition",
        lua.create_function(move |_, row: u64| {
            s.borrow_mut().set_row_pos(row);
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getRowOffset",
        lua.create_function(move |_, ()| Ok(s.borrow().row_offset()))?,
    )?;
    let s = session.clone();
    globals.set(
        "updateRowPosition",
        lua.create_function(move |_, ()| {
            s.borrow_mut().update_row_position();
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getLastPressedKey",
        lua.create_function(move |_, ()| Ok(s.borrow().last_key()))?,
    )?;

    let s = session.clone();
    globals.set(
        "getUIState",
        lua.create_function(move |_, ()| {
            Ok(match s.borrow().mode() {
                Mode::Default => 0,
                Mode::Hex => 1,
                Mode::InfoAsking => 2,
                Mode::Info => 3,
            })
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "setUIState",
        lua.create_function(move |_, state: i64| {
            let mut session = s.borrow_mut();
            match state {
                0 => session.set_mode(Mode::Default),
                1 => session.set_mode(Mode::Hex),
                2 => session.set_mode(Mode::InfoAsking),
                3 => session.set_mode(Mode::Info),
                _ => {}
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getUIBarAsking",
        lua.create_function(move |_, ()| {
            Ok(match s.borrow().prompt() {
                Prompt::None => 0,
                Prompt::ConfirmExit => 1,
                Prompt::ConfirmSave => 2,
            })
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getHexViewState",
        lua.create_function(move |_, ()| {
            Ok(match s.borrow().hex_state() {
                HexViewState::Default => 0,
                HexViewState::Editing => 1,
            })
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "setHexViewState",
        lua.create_function(move |_, state: i64| {
            let mut session = s.borrow_mut();
            match state {
                0 => session.set_hex_state(HexViewState::Default),
                1 => session.set_hex_state(HexViewState::Editing),
                _ => {}
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getEditingPosition",
        lua.create_function(move |_, ()| {
            Ok(match s.borrow().nibble() {
                NibblePos::High => 0,
                NibblePos::Low => 1,
            })
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "setEditingPosition",
        lua.create_function(move |_, nibble: i64| {
            let mut session = s.borrow_mut();
            match nibble {
                0 => session.set_nibble(NibblePos::High),
                1 => session.set_nibble(NibblePos::Low),
                _ => {}
            }
            Ok(())
        })?,
    )?;

    let s = session.clone();
    globals.set(
        "getShouldExit",
        lua.create_function(move |_, ()| Ok(s.borrow().should_exit()))?,
    )?;
    let s = session.clone();
    globals.set(
        "setShouldExit",
        lua.create_function(move |_, value: bool| {
            s.borrow_mut().set_should_exit(value);
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getShouldQuickExit",
        lua.create_function(move |_, ()| Ok(s.borrow().quick_exit()))?,
    )?;
    let s = session.clone();
    globals.set(
        "setShouldQuickExit",
        lua.create_function(move |_, value: bool| {
            s.borrow_mut().set_quick_exit(value);
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getShouldEditMoveForward",
        lua.create_function(move |_, ()| Ok(s.borrow().edit_move_forward()))?,
    )?;
    let s = session.clone();
    globals.set(
        "setShouldEditMoveForward",
        lua.create_function(move |_, value: bool| {
            s.borrow_mut().set_edit_move_forward(value);
            Ok(())
        })?,
    )?;

    let s = session.clone();
    globals.set(
        "setBarMessage",
        lua.create_function(move |_, message: String| {
            s.borrow_mut().set_bar_message(&message);
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "clearBarMessage",
        lua.create_function(move |_, ()| {
            s.borrow_mut().clear_bar_message();
            Ok(())
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getBarMessage",
        lua.create_function(move |_, ()| Ok(s.borrow().bar_message().to_owned()))?,
    )?;

    let s = session.clone();
    globals.set(
        "getConfigPath",
        lua.create_function(move |_, ()| {
            Ok(s.borrow().config_path().to_string_lossy().into_owned())
        })?,
    )?;

    // Geometry.
    let s = session.clone();
    globals.set(
        "getBytesPerRow",
        lua.create_function(move |_, ()| Ok(s.borrow().bytes_per_row()))?,
    )?;
    let s = session.clone();
    globals.set(
        "getRowsVisible",
        lua.create_function(move |_, ()| Ok(s.borrow().visible_rows()))?,
    )?;
    let s = session.clone();
    globals.set(
        "getHexX",
        lua.create_function(move |_, ()| {
            let session = s.borrow();
            Ok(session.viewport().hex_x(session.panels()))
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getHexY",
        lua.create_function(move |_, ()| Ok(s.borrow().viewport().hex_y()))?,
    )?;
    let s = session.clone();
    globals.set(
        "getHexWidth",
        lua.create_function(move |_, ()| {
            let session = s.borrow();
            Ok(session.viewport().hex_width(session.panels()))
        })?,
    )?;
    let s = session.clone();
    globals.set(
        "getHexHeight",
        lua.create_function(move |_, ()| Ok(s.borrow().viewport().hex_height()))?,
    )?;

    let st = store.clone();
    globals.set(
        "getFileEnd",
        lua.create_function(move |_, ()| Ok(st.borrow().file_end()))?,
    )?;

    install_key_predicates(lua)?;
    Ok(())
}

fn install_key_predicates(lua: &Lua) -> Result<(), ScriptError> {
    let globals = lua.globals();
    let predicates: [(&str, fn(KeyCode) -> bool); 16] = [
        ("isExitKey", keys::is_exit_key),
        ("isYesKey", keys::is_yes_key),
        ("isQuestionKey", keys::is_question_key),
        ("isUpKey", keys::is_up_key),
        ("isDownKey", keys::is_down_key),
        ("isLeftKey", keys::is_left_key),
        ("isRightKey", keys::is_right_key),
        ("isEnterKey", keys::is_enter_key),
        ("isSaveKey", keys::is_save_key),
        ("isEndOfFileKey", keys::is_end_of_file_key),
        ("isPageDownKey", keys::is_page_down_key),
        ("isPageUpKey", keys::is_page_up_key),
        ("isEndKey", keys::is_end_key),
        ("isHomeKey", keys::is_home_key),
        ("isUndoKey", keys::is_undo_key),
        ("isRedoKey", keys::is_redo_key),
    ];
    for (name, predicate) in predicates {
        globals.set(name, lua.create_function(move |_, key: KeyCode| Ok(predicate(key)))?)?;
    }
    globals.set(
        "isHexDigitKey",
        lua.create_function(|_, key: KeyCode| Ok(keys::is_hex_digit_key(key)))?,
    )?;
    globals.set(
        "isDisplayableKey",
        lua.create_function(|_, key: KeyCode| Ok(bytes::is_displayable(key)))?,
    )?;

    globals.set(
        "hexChar",
        lua.create_function(|_, value: u8| Ok(bytes::hex_char(value & 0x0f).to_string()))?,
    )?;
    globals.set(
        "byteToString",
        lua.create_function(|_, byte: u8| Ok(bytes::byte_to_string(byte)))?,
    )?;
    globals.set(
        "byteToStringPadded",
        lua.create_function(|_, byte: u8| Ok(bytes::byte_to_string_padded(byte)))?,
    )?;
    Ok(())
}

fn install_store_api(
    lua: &Lua,
    store: &SharedStore,
    ext: &SharedExtensions,
) -> Result<(), ScriptError> {
    let globals = lua.globals();

    let st = store.clone();
    globals.set(
        "hasByte",
        lua.create_function(move |_, offset: u64| Ok(offset < st.borrow().file_end()))?,
    )?;
    let st = store.clone();
    globals.set(
        "readByte",
        lua.create_function(move |_, offset: u64| Ok(st.borrow_mut().read(offset)))?,
    )?;
    let st = store.clone();
    globals.set(
        "readBytes",
        lua.create_function(move |lua, (offset, len): (u64, usize)| {
            let data = st.borrow_mut().read_range(offset, len);
            let table = lua.create_table_with_capacity(data.len(), 0)?;
            for (i, byte) in data.iter().enumerate() {
                table.set(i + 1, *byte)?;
            }
            Ok(table)
        })?,
    )?;
    let st = store.clone();
    globals.set(
        "isReadOnly",
        lua.create_function(move |_, ()| Ok(st.borrow().is_read_only()))?,
    )?;
    let st = store.clone();
    globals.set(
        "hasUnsavedChanges",
        lua.create_function(move |_, ()| Ok(st.borrow().has_unsaved_edits()))?,
    )?;
    let st = store.clone();
    globals.set(
        "editByte",
        lua.create_function(move |_, (offset, value): (u64, u8)| {
            st.borrow_mut().edit(offset, value).map_err(mlua::Error::external)
        })?,
    )?;

    let st = store.clone();
    let ex = ext.clone();
    globals.set(
        "undoEdit",
        lua.create_function(move |_, ()| {
            let step = st.borrow_mut().undo();
            if let Some(step) = step {
                let listeners = ex.borrow().undo_listener_snapshot();
                for listener in listeners {
                    listener(step.pos).map_err(mlua::Error::external)?;
                }
                return Ok(true);
            }
            Ok(false)
        })?,
    )?;
    let st = store.clone();
    let ex = ext.clone();
    globals.set(
        "redoEdit",
        lua.create_function(move |_, ()| {
            let step = st.borrow_mut().redo();
            if let Some(step) = step {
                let listeners = ex.borrow().redo_listener_snapshot();
                for listener in listeners {
                    listener(step.pos).map_err(mlua::Error::external)?;
                }
                return Ok(true);
            }
            Ok(false)
        })?,
    )?;

    let st = store.clone();
    globals.set(
        "saveFile",
        lua.create_function(move |_, ()| {
            st.borrow_mut().commit().map_err(mlua::Error::external)
        })?,
    )?;
    Ok(())
}

fn install_handler_api(lua: &Lua, ext: &SharedExtensions) -> Result<(), ScriptError> {
    let globals = lua.globals();

    let ex = ext.clone();
    globals.set(
        "registerKeyHandler",
        lua.create_function(move |_, handler: Function| {
            let id = ex.borrow_mut().register_key_handler(Rc::new(move |key| {
                handler
                    .call::<Value>(key)
                    .map(verdict_from_value)
                    .map_err(|err| callback_error("key handler", err))
            }));
            Ok(id)
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "removeKeyHandler",
        lua.create_function(move |_, id: u32| {
            ex.borrow_mut().remove_key_handler(id);
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "getNextKeyHandlerID",
        lua.create_function(move |_, ()| Ok(ex.borrow().next_key_handler_id()))?,
    )?;

    let ex = ext.clone();
    globals.set(
        "listenForInit",
        lua.create_function(move |_, listener: Function| {
            ex.borrow_mut().listen_for_init(Rc::new(move || {
                listener
                    .call::<()>(())
                    .map_err(|err| callback_error("init listener", err))
            }));
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "listenForSave",
        lua.create_function(move |_, listener: Function| {
            ex.borrow_mut().listen_for_save(Rc::new(move || {
                listener
                    .call::<()>(())
                    .map_err(|err| callback_error("save listener", err))
            }));
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "listenForUndo",
        lua.create_function(move |_, listener: Function| {
            ex.borrow_mut().listen_for_undo(Rc::new(move |pos| {
                listener
                    .call::<()>(pos)
                    .map_err(|err| callback_error("undo listener", err))
            }));
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "listenForRedo",
        lua.create_function(move |_, listener: Function| {
            ex.borrow_mut().listen_for_redo(Rc::new(move |pos| {
                listener
                    .call::<()>(pos)
                    .map_err(|err| callback_error("redo listener", err))
            }));
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "listenForWrite",
        lua.create_function(move |lua, listener: Function| {
            let lua = lua.clone();
            ex.borrow_mut().listen_for_write(Rc::new(move |data, offset| {
                let table = lua
                    .create_table_with_capacity(data.len(), 0)
                    .map_err(|err| callback_error("write listener", err))?;
                for (i, byte) in data.iter().enumerate() {
                    table
                        .set(i + 1, *byte)
                        .map_err(|err| callback_error("write listener", err))?;
                }
                listener
                    .call::<()>((table, offset))
                    .map_err(|err| callback_error("write listener", err))
            }));
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "clearWriteListener",
        lua.create_function(move |_, ()| {
            ex.borrow_mut().clear_write_listener();
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "hasWriteListeners",
        lua.create_function(move |_, ()| Ok(ex.borrow().has_write_listener()))?,
    )?;

    // Mirrors the editor's save path: a failing listener aborts the rest.
    let ex = ext.clone();
    globals.set(
        "runSaveListeners",
        lua.create_function(move |_, ()| {
            let listeners = ex.borrow().save_listener_snapshot();
            for listener in listeners {
                listener().map_err(mlua::Error::external)?;
            }
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "runWriteListeners",
        lua.create_function(move |_, (data, offset): (Vec<u8>, u64)| {
            let listener = ex.borrow().write_listener();
            if let Some(listener) = listener {
                listener(&data, offset).map_err(mlua::Error::external)?;
            }
            Ok(())
        })?,
    )?;

    let ex = ext.clone();
    globals.set(
        "registerInfo",
        lua.create_function(move |_, (title, text): (String, Function)| {
            ex.borrow_mut().register_note(
                &title,
                Rc::new(move || {
                    text.call::<String>(())
                        .map_err(|err| callback_error("info callback", err))
                }),
            );
            Ok(())
        })?,
    )?;
    let ex = ext.clone();
    globals.set(
        "deregisterInfo",
        lua.create_function(move |_, title: String| {
            ex.borrow_mut().deregister_note(&title);
            Ok(())
        })?,
    )?;
    Ok(())
}

fn install_view_api(
    lua: &Lua,
    session: &SharedSession,
    screen: &SharedScreen,
    ext: &SharedExtensions,
) -> Result<(), ScriptError> {
    let globals = lua.globals();

    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "moveView",
        lua.create_function(move |_, (y, x): (u16, u16)| {
            if let Some(view) = s.borrow().view_window() {
                sc.borrow_mut().move_to(view, x, y);
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "printView",
        lua.create_function(move |_, text: String| {
            if let Some(view) = s.borrow().view_window() {
                sc.borrow_mut().print(view, &text);
            }
            Ok(())
        })?,
    )?;

    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "enableAttribute",
        lua.create_function(move |_, attr: i64| {
            if let (Some(view), Some(attr)) =
                (s.borrow().view_window(), TextAttr::from_index(attr))
            {
                sc.borrow_mut().set_attr(view, attr, true);
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "disableAttribute",
        lua.create_function(move |_, attr: i64| {
            if let (Some(view), Some(attr)) =
                (s.borrow().view_window(), TextAttr::from_index(attr))
            {
                sc.borrow_mut().set_attr(view, attr, false);
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "enableColor",
        lua.create_function(move |_, pair: u8| {
            if let Some(view) = s.borrow().view_window() {
                sc.borrow_mut().set_color(view, pair, true);
            }
            Ok(())
        })?,
    )?;
    let s = session.clone();
    let sc = screen.clone();
    globals.set(
        "disableColor",
        lua.create_function(move |_, pair: u8| {
            if let Some(view) = s.borrow().view_window() {
                sc.borrow_mut().set_color(view, pair, false);
            }
            Ok(())
        })?,
    )?;

    let s = session.clone();
    let sc = screen.clone();
    let ex = ext.clone();
    globals.set(
        "createSubView",
        lua.create_function(move |_, side: i64| {
            let side = PanelSide::from_index(side)
                .ok_or_else(|| mlua::Error::external("unknown view location"))?;
            let id = s.borrow_mut().panels_mut().create(side);
            Ok(SubViewHandle {
                id,
                session: s.clone(),
                ext: ex.clone(),
                screen: sc.clone(),
            })
        })?,
    )?;
    let s = session.clone();
    let sc = screen.clone();
    let ex = ext.clone();
    globals.set(
        "getSubView",
        lua.create_function(move |_, raw: usize| {
            let id = PanelId::from_raw(raw);
            if s.borrow().panels().get(id).is_none() {
                return Ok(None);
            }
            Ok(Some(SubViewHandle {
                id,
                session: s.clone(),
                ext: ex.clone(),
                screen: sc.clone(),
            }))
        })?,
    )?;
    Ok(())
}

fn install_plugin_api(lua: &Lua, diag: &SharedDiag) -> Result<(), ScriptError> {
    let globals = lua.globals();

    let dg = diag.clone();
    globals.set(
        "logAtExit",
        lua.create_function(move |_, parts: Variadic<String>| {
            dg.borrow_mut().push(parts.join(" "));
            Ok(())
        })?,
    )?;

    globals.set(
        "loadPlugin",
        lua.create_function(|lua, path: String| {
            let source = fs::read_to_string(&path).map_err(mlua::Error::external)?;
            lua.load(&source).set_name(path).exec()
        })?,
    )?;
    Ok(())
}
