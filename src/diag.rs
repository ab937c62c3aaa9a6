// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Session-owned diagnostic log.
//!
//! Messages accumulate in order for the lifetime of the session and are
//! flushed to stdout only after the terminal has been restored, so raw-mode
//! cleanup never races with log output.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<String>,
    debug: bool,
}

pub type SharedDiag = Rc<RefCell<DiagnosticLog>>;

impl DiagnosticLog {
    pub fn new(debug: bool) -> Self {
        Self { entries: Vec::new(), debug }
    }

    pub fn shared(debug: bool) -> SharedDiag {
        Rc::new(RefCell::new(Self::new(debug)))
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// Records `message` only when debug mode is on.
    pub fn debug(&mut self, message: impl Into<String>) {
        if self.debug {
            self.entries.push(message.into());
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Writes all entries in order; a session that logged nothing still gets
    /// a terse goodbye so the user sees the program exited cleanly.
    pub fn flush_to(&self, out: &mut impl Write) -> io::Result<()> {
        if self.entries.is_empty() {
            writeln!(out, "Exited.")?;
            return Ok(());
        }
        for entry in &self.entries {
            writeln!(out, "{entry}")?;
        }
        Ok(())
    }
}
