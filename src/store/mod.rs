// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Byte storage: chunked file reads, a pending edit overlay, and undo/redo
//! history.
//!
//! The buffer never loads the whole file. Reads go through a single cached
//! chunk; edits land in an overlay map until [`FileBuffer::commit`] writes
//! them back destructively. An optional byte-range restriction narrows the
//! editable window, with all offsets window-relative.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub type SharedStore = Rc<RefCell<FileBuffer>>;

/// One undo/redo step: the offset it touched and the bytes involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub pos: u64,
    pub bytes: SmallVec<[u8; 8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EditRecord {
    pos: u64,
    /// Overlay value this edit replaced; `None` when the byte was clean.
    previous: Option<u8>,
    value: u8,
}

#[derive(Debug)]
struct Chunk {
    offset: u64,
    data: Vec<u8>,
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    ReadOnly,
    EmptyRange,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "file access failed: {err}"),
            Self::ReadOnly => f.write_str("buffer is read-only"),
            Self::EmptyRange => f.write_str("byte range restriction selects nothing"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub struct FileBuffer {
    file: File,
    /// Window start in the underlying file.
    window_start: u64,
    /// Window length; offsets `0..window_len` are addressable.
    window_len: u64,
    read_only: bool,
    chunk_size: usize,
    overlay: BTreeMap<u64, u8>,
    undo_stack: Vec<EditRecord>,
    redo_stack: Vec<EditRecord>,
    cache: Option<Chunk>,
}

impl fmt::Debug for FileBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBuffer")
            .field("window_start", &self.window_start)
            .field("window_len", &self.window_len)
            .field("read_only", &self.read_only)
            .field("pending_edits", &self.overlay.len())
            .finish()
    }
}

impl FileBuffer {
    /// Opens `path`, optionally restricted to `[start, end)` of the file.
    /// A start past end-of-file yields an empty window; `end` is clamped.
    pub fn open(
        path: &Path,
        read_only: bool,
        range: (u64, Option<u64>),
        chunk_size: usize,
    ) -> Result<Self, StoreError> {
        let file = OpenOptions::new().read(true).write(!read_only).open(path)?;
        let file_len = file.metadata()?.len();

        let (start, end) = range;
        let window_start = start.min(file_len);
        let window_end = end.unwrap_or(file_len).min(file_len);
        if end.is_some() && window_end <= window_start {
            return Err(StoreError::EmptyRange);
        }
        let window_len = window_end.saturating_sub(window_start);

        Ok(Self {
            file,
            window_start,
            window_len,
            read_only,
            chunk_size: chunk_size.max(1),
            overlay: BTreeMap::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            cache: None,
        })
    }

    pub fn shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }

    /// One past the last addressable offset.
    pub fn file_end(&self) -> u64 {
        self.window_len
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn has_unsaved_edits(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Reads one byte. Past end-of-file is `None`, never an error.
    pub fn read(&mut self, offset: u64) -> Option<u8> {
        if offset >= self.window_len {
            return None;
        }
        if let Some(&byte) = self.overlay.get(&offset) {
            return Some(byte);
        }
        self.read_disk(offset)
    }

    /// Reads up to `len` bytes starting at `offset`, truncated at
    /// end-of-file.
    pub fn read_range(&mut self, offset: u64, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len.min(self.window_len as usize));
        for i in 0..len as u64 {
            match self.read(offset + i) {
                Some(byte) => out.push(byte),
                None => break,
            }
        }
        out
    }

    /// Stages an edit and records it in history. New edits clear the redo
    /// stack.
    pub fn edit(&mut self, offset: u64, value: u8) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        if offset >= self.window_len {
            return Ok(());
        }
        let previous = self.overlay.insert(offset, value);
        self.undo_stack.push(EditRecord { pos: offset, previous, value });
        self.redo_stack.clear();
        Ok(())
    }

    /// Reverts the most recent edit. Returns the step that was undone, or
    /// `None` when the history is empty.
    pub fn undo(&mut self) -> Option<HistoryStep> {
        let record = self.undo_stack.pop()?;
        match record.previous {
            Some(byte) => {
                self.overlay.insert(record.pos, byte);
            }
            None => {
                self.overlay.remove(&record.pos);
            }
        }
        self.redo_stack.push(record);
        Some(HistoryStep { pos: record.pos, bytes: smallvec![record.value] })
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self) -> Option<HistoryStep> {
        let record = self.redo_stack.pop()?;
        self.overlay.insert(record.pos, record.value);
        self.undo_stack.push(record);
        Some(HistoryStep { pos: record.pos, bytes: smallvec![record.value] })
    }

    /// Writes every staged edit back to the file and clears all history.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        for (&offset, &byte) in &self.overlay {
            self.file.seek(SeekFrom::Start(self.window_start + offset))?;
            self.file.write_all(&[byte])?;
        }
        self.file.flush()?;
        self.overlay.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.cache = None;
        Ok(())
    }

    fn read_disk(&mut self, offset: u64) -> Option<u8> {
        if let Some(chunk) = &self.cache {
            if offset >= chunk.offset && offset < chunk.offset + chunk.data.len() as u64 {
                return Some(chunk.data[(offset - chunk.offset) as usize]);
            }
        }
        self.load_chunk(offset).ok()?;
        let chunk = self.cache.as_ref()?;
        let index = offset.checked_sub(chunk.offset)? as usize;
        chunk.data.get(index).copied()
    }

    fn load_chunk(&mut self, offset: u64) -> io::Result<()> {
        let chunk_start = offset - (offset % self.chunk_size as u64);
        let remaining = (self.window_len - chunk_start) as usize;
        let len = remaining.min(self.chunk_size);

        let mut data = vec![0u8; len];
        self.file.seek(SeekFrom::Start(self.window_start + chunk_start))?;
        let mut filled = 0;
        while filled < len {
            let n = self.file.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data.truncate(filled);
        self.cache = Some(Chunk { offset: chunk_start, data });
        Ok(())
    }
}
