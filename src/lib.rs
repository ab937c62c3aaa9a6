// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! hexide: a Lua-scriptable terminal hex editor.
//!
//! The session engine (modal state machine, cursor/scroll controller, layout
//! geometry, key dispatch chain) lives in `session`, `layout`, and `tui`.
//! Plugins talk to it through the `ext` registries via the `script` host.

pub mod bytes;
pub mod diag;
pub mod ext;
pub mod keys;
pub mod layout;
pub mod paths;
pub mod script;
pub mod session;
pub mod store;
pub mod term;
pub mod tui;
