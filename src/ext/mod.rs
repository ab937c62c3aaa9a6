// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Extension surface.
//!
//! Everything guest code can hook into lives here: key handlers, lifecycle
//! listeners, the write interceptor, info notes, and per-panel draw
//! callbacks. Registrations are plain `Rc<dyn Fn>` values, so the scripting
//! host and native tests register through the same door.


use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::layout::PanelId;
use crate::session::{CallbackError, KeyHandlerFn};

pub type SharedExtensions = Rc<RefCell<Extensions>>;

/// Nullary lifecycle listener (init, save).
pub type ListenerFn = Rc<dyn Fn() -> Result<(), CallbackError>>;

/// Listener handed the byte offset an undo or redo touched.
pub type OffsetListenerFn = Rc<dyn Fn(u64) -> Result<(), CallbackError>>;

/// Interceptor for the bytes about to be rendered, with their start offset.
pub type WriteListenerFn = Rc<dyn Fn(&[u8], u64) -> Result<(), CallbackError>>;

/// Produces the body text of an info note on demand.
pub type NoteTextFn = Rc<dyn Fn() -> Result<String, CallbackError>>;

/// Draw callback for one panel.
pub type PanelRenderFn = Rc<dyn Fn() -> Result<(), CallbackError>>;

/// Resize callback for one panel.
pub type PanelResizeFn = Rc<dyn Fn() -> Result<(), CallbackError>>;

#[derive(Default)]
pub struct Extensions {
    next_handler_id: u32,
    key_handlers: Vec<(u32, KeyHandlerFn)>,
    init_listeners: Vec<ListenerFn>,
    save_listeners: Vec<ListenerFn>,
    undo_listeners: Vec<OffsetListenerFn>,
    redo_listeners: Vec<OffsetListenerFn>,
    write_listener: Option<WriteListenerFn>,
    notes: Vec<(String, NoteTextFn)>,
    panel_render: BTreeMap<PanelId, PanelRenderFn>,
    panel_resize: BTreeMap<PanelId, PanelResizeFn>,
}

impl Extensions {
    pub fn shared() -> SharedExtensions {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Id the next registration will receive. Ids are never reused, even
    /// after removal.
    pub fn next_key_handler_id(&self) -> u32 {
        self.next_handler_id
    }

    pub fn register_key_handler(&mut self, handler: KeyHandlerFn) -> u32 {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        self.key_handlers.push((id, handler));
        id
    }

    /// Removes a handler by id. Unknown ids are ignored.
    pub fn remove_key_handler(&mut self, id: u32) {
        self.key_handlers.retain(|(handler_id, _)| *handler_id != id);
    }

    /// Snapshot of the handler chain in registration order. Taken before
    /// dispatch so handlers registered mid-chain wait until next cycle.
    pub fn key_handler_snapshot(&self) -> Vec<(u32, KeyHandlerFn)> {
        self.key_handlers.clone()
    }

    pub fn listen_for_init(&mut self, listener: ListenerFn) {
        self.init_listeners.push(listener);
    }

    /// Init listeners fire once; taking them empties the registry.
    pub fn take_init_listeners(&mut self) -> Vec<ListenerFn> {
        std::mem::take(&mut self.init_listeners)
    }

    pub fn listen_for_save(&mut self, listener: ListenerFn) {
        self.save_listeners.push(listener);
    }

    pub fn save_listener_snapshot(&self) -> Vec<ListenerFn> {
        self.save_listeners.clone()
    }

    pub fn listen_for_undo(&mut self, listener: OffsetListenerFn) {
        self.undo_listeners.push(listener);
    }

    pub fn undo_listener_snapshot(&self) -> Vec<OffsetListenerFn> {
        self.undo_listeners.clone()
    }

    pub fn listen_for_redo(&mut self, listener: OffsetListenerFn) {
        self.redo_listeners.push(listener);
    }

    pub fn redo_listener_snapshot(&self) -> Vec<OffsetListenerFn> {
        self.redo_listeners.clone()
    }

    /// Installs the write interceptor. Only one can be active; a new
    /// registration replaces the previous one.
    pub fn listen_for_write(&mut self, listener: WriteListenerFn) {
        self.write_listener = Some(listener);
    }

    pub fn clear_write_listener(&mut self) {
        self.write_listener = None;
    }

    pub fn has_write_listener(&self) -> bool {
        self.write_listener.is_some()
    }

    pub fn write_listener(&self) -> Option<WriteListenerFn> {
        self.write_listener.clone()
    }

    pub fn register_note(&mut self, title: &str, text: NoteTextFn) {
        self.notes.push((title.to_owned(), text));
    }

    /// Drops the first note with a matching title.
    pub fn deregister_note(&mut self, title: &str) {
        if let Some(index) = self.notes.iter().position(|(name, _)| name == title) {
            self.notes.remove(index);
        }
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn note_titles(&self) -> Vec<String> {
        self.notes.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn note_text_fn(&self, index: usize) -> Option<NoteTextFn> {
        self.notes.get(index).map(|(_, text)| text.clone())
    }

    pub fn set_panel_render(&mut self, panel: PanelId, callback: PanelRenderFn) {
        self.panel_render.insert(panel, callback);
    }

    pub fn clear_panel_render(&mut self, panel: PanelId) {
        self.panel_render.remove(&panel);
    }

    pub fn panel_render_snapshot(&self) -> Vec<(PanelId, PanelRenderFn)> {
        self.panel_render.iter().map(|(id, cb)| (*id, cb.clone())).collect()
    }

    /// Drops every registration. Run at shutdown: scripted callbacks keep
    /// their interpreter (and everything it captured) alive until they are
    /// released.
    pub fn clear_all(&mut self) {
        self.key_handlers.clear();
        self.init_listeners.clear();
        self.save_listeners.clear();
        self.undo_listeners.clear();
        self.redo_listeners.clear();
        self.write_listener = None;
        self.notes.clear();
        self.panel_render.clear();
        self.panel_resize.clear();
    }

    pub fn set_panel_resize(&mut self, panel: PanelId, callback: PanelResizeFn) {
        self.panel_resize.insert(panel, callback);
    }

    pub fn clear_panel_resize(&mut self, panel: PanelId) {
        self.panel_resize.remove(&panel);
    }

    pub fn panel_resize_snapshot(&self) -> Vec<(PanelId, PanelResizeFn)> {
        self.panel_resize.iter().map(|(id, cb)| (*id, cb.clone())).collect()
    }
}
