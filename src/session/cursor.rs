// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Cursor movement and scroll tracking.
//!
//! All movement is expressed against the current geometry: bytes per row
//! follows the terminal width and panel layout, a page is one screenful of
//! the hex view. `update_row_position` is the single scroll rule; every
//! operation that moves the selection runs it afterwards.

use super::{NibblePos, SessionState};

impl SessionState {
    /// Row index of the selected byte, counted from the start of the file.
    pub fn selected_row(&self) -> u64 {
        let bpr = self.bytes_per_row();
        if bpr == 0 {
            return 0;
        }
        self.selected_pos() / bpr
    }

    /// Re-anchors the top visible row so the selection stays on screen.
    ///
    /// With a degenerate geometry (zero-width rows or a zero-height view)
    /// the scroll anchor is left where it was.
    pub fn update_row_position(&mut self) {
        let bpr = self.bytes_per_row();
        let rows = self.visible_rows();
        if bpr == 0 || rows == 0 {
            return;
        }

        let sel = self.selected_pos();
        let top = self.row_pos() * bpr;
        if sel == 0 {
            self.set_row_pos(0);
        } else if sel < top {
            let row = self.selected_row();
            self.set_row_pos(row);
        } else if sel >= top + bpr * rows {
            let row = self.selected_row();
            self.set_row_pos(row + 1 - rows);
        }
    }

    pub fn move_down(&mut self, file_end: u64) {
        let bpr = self.bytes_per_row();
        if self.selected_pos() + bpr < file_end {
            self.set_selected_pos(self.selected_pos() + bpr);
        }
        self.update_row_position();
    }

    pub fn move_up(&mut self) {
        let bpr = self.bytes_per_row();
        if self.selected_pos() >= bpr {
            self.set_selected_pos(self.selected_pos() - bpr);
        }
        self.update_row_position();
    }

    pub fn move_left(&mut self) {
        self.set_selected_pos(self.selected_pos().saturating_sub(1));
        self.update_row_position();
    }

    pub fn move_right(&mut self, file_end: u64) {
        if self.selected_pos() + 1 < file_end {
            self.set_selected_pos(self.selected_pos() + 1);
        }
        self.update_row_position();
    }

    /// Left movement while editing steps by half a byte: from the low
    /// nibble it only retargets the high one, from the high nibble it
    /// leaves the byte.
    pub fn move_left_editing(&mut self) {
        match self.nibble() {
            NibblePos::Low => self.set_nibble(NibblePos::High),
            NibblePos::High => {
                self.set_nibble(NibblePos::Low);
                self.move_left();
            }
        }
    }

    pub fn move_right_editing(&mut self, file_end: u64) {
        match self.nibble() {
            NibblePos::High => self.set_nibble(NibblePos::Low),
            NibblePos::Low => {
                self.set_nibble(NibblePos::High);
                self.move_right(file_end);
            }
        }
    }

    /// Advances one screenful. Overshoots by a second page before
    /// re-anchoring so the landing row becomes the new top, then retreats
    /// to the real target.
    pub fn page_down(&mut self, file_end: u64) {
        let page = self.page_size();
        if self.selected_pos() + page < file_end {
            self.set_selected_pos(self.selected_pos() + 2 * page);
            self.update_row_position();
            self.set_selected_pos(self.selected_pos() - page);
        } else {
            self.jump_end_of_file(file_end);
        }
    }

    pub fn page_up(&mut self) {
        let page = self.page_size();
        if self.selected_pos() >= page {
            self.set_selected_pos(self.selected_pos() - page);
        } else {
            self.set_selected_pos(0);
        }
        self.update_row_position();
    }

    pub fn jump_start_of_file(&mut self) {
        self.set_selected_pos(0);
        self.update_row_position();
    }

    pub fn jump_end_of_file(&mut self, file_end: u64) {
        self.set_selected_pos(file_end.saturating_sub(1));
        self.update_row_position();
    }

    pub fn jump_start_of_line(&mut self) {
        let bpr = self.bytes_per_row();
        if bpr == 0 {
            self.set_selected_pos(0);
        } else {
            self.set_selected_pos((self.selected_pos() / bpr) * bpr);
        }
        self.update_row_position();
    }

    pub fn jump_end_of_line(&mut self, file_end: u64) {
        let bpr = self.bytes_per_row();
        if bpr == 0 {
            self.set_selected_pos(0);
        } else {
            let end_of_line = (self.selected_pos() / bpr) * bpr + bpr - 1;
            self.set_selected_pos(end_of_line.min(file_end.saturating_sub(1)));
        }
        self.update_row_position();
    }
}
