// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Key dispatch protocol.
//!
//! Before any built-in action runs, the key is offered to every registered
//! handler in registration order. Handlers return a verdict; the accumulated
//! permissions decide which built-in action categories (functional, special,
//! drawing) still run this cycle. Stopping the chain only stops *handlers*;
//! built-ins still honor whatever permissions survived.

use std::fmt;
use std::rc::Rc;

use crate::keys::KeyCode;

/// Bitmask values handlers use to grant action categories.
pub mod mask {
    pub const FULL_STOP: u8 = 0;
    pub const HANDLER: u8 = 1;
    pub const FUNCTIONAL: u8 = 2;
    pub const SPECIAL: u8 = 4;
    pub const DRAWING: u8 = 8;
    pub const ALL: u8 = HANDLER | FUNCTIONAL | SPECIAL | DRAWING;
}

/// What a single handler had to say about the current key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerVerdict {
    /// Handler had no opinion; permissions unchanged, chain continues.
    NoOpinion,
    /// Restrict permissions to the granted bits, keep consulting handlers.
    Continue(u8),
    /// Restrict permissions to the granted bits and stop the chain.
    Stop(u8),
}

impl HandlerVerdict {
    /// Interprets a raw bitmask the way guest code reports it: the full
    /// grant is a no-op sentinel, a mask without the handler bit ends the
    /// chain.
    pub fn from_mask(value: i64) -> Self {
        let Ok(bits) = u8::try_from(value & i64::from(mask::ALL)) else {
            return Self::NoOpinion;
        };
        if bits == mask::ALL {
            Self::NoOpinion
        } else if bits & mask::HANDLER != 0 {
            Self::Continue(bits)
        } else {
            Self::Stop(bits)
        }
    }
}

/// Per-cycle permission record. Everything defaults to allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub handler: bool,
    pub functional: bool,
    pub special: bool,
    pub drawing: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self { handler: true, functional: true, special: true, drawing: true }
    }
}

impl Permissions {
    fn restrict(&mut self, bits: u8) {
        if bits & mask::FUNCTIONAL == 0 {
            self.functional = false;
        }
        if bits & mask::SPECIAL == 0 {
            self.special = false;
        }
        if bits & mask::DRAWING == 0 {
            self.drawing = false;
        }
    }
}

/// Error raised by an externally-registered callback. Fatal to the event
/// cycle that invoked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError {
    context: &'static str,
    message: String,
}

impl CallbackError {
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self { context, message: message.into() }
    }

    pub fn context(&self) -> &'static str {
        self.context
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error in {}: {}", self.context, self.message)
    }
}

impl std::error::Error for CallbackError {}

pub type KeyHandlerFn = Rc<dyn Fn(KeyCode) -> Result<HandlerVerdict, CallbackError>>;

/// Runs the handler chain for `key` and returns the surviving permissions.
///
/// The slice is a snapshot: handlers registered mid-chain take effect next
/// cycle. A handler error propagates immediately and unwinds the cycle.
pub fn run_chain(
    handlers: &[(u32, KeyHandlerFn)],
    key: KeyCode,
) -> Result<Permissions, CallbackError> {
    let mut permissions = Permissions::default();

    for (_, handler) in handlers {
        match handler(key)? {
            HandlerVerdict::NoOpinion => {}
            HandlerVerdict::Continue(bits) => permissions.restrict(bits),
            HandlerVerdict::Stop(bits) => {
                permissions.restrict(bits);
                permissions.handler = false;
                break;
            }
        }
    }

    Ok(permissions)
}
