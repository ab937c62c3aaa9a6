// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Key codes and classification predicates.
//!
//! Keys travel through the editor (and into Lua handlers) as plain integers:
//! printable ASCII as itself, control chords as ASCII control codes, and
//! navigation keys in a private range above `0xFF`. `KEY_RESIZE` is a
//! synthetic code the terminal backend emits when the window changes size.

pub type KeyCode = i32;

pub const KEY_NONE: KeyCode = -1;
pub const KEY_DOWN: KeyCode = 0x102;
pub const KEY_UP: KeyCode = 0x103;
pub const KEY_LEFT: KeyCode = 0x104;
pub const KEY_RIGHT: KeyCode = 0x105;
pub const KEY_HOME: KeyCode = 0x106;
pub const KEY_END: KeyCode = 0x107;
pub const KEY_PAGE_DOWN: KeyCode = 0x108;
pub const KEY_PAGE_UP: KeyCode = 0x109;
pub const KEY_RESIZE: KeyCode = 0x200;

pub const CTRL_S: KeyCode = 0x13;
pub const CTRL_Y: KeyCode = 0x19;
pub const CTRL_Z: KeyCode = 0x1A;

pub const fn is_exit_key(k: KeyCode) -> bool {
    k == 'q' as KeyCode || k == 'Q' as KeyCode
}

pub const fn is_yes_key(k: KeyCode) -> bool {
    k == 'y' as KeyCode || k == 'Y' as KeyCode
}

pub const fn is_question_key(k: KeyCode) -> bool {
    k == '?' as KeyCode
}

pub const fn is_up_key(k: KeyCode) -> bool {
    k == KEY_UP || k == 'k' as KeyCode || k == 'K' as KeyCode
}

pub const fn is_down_key(k: KeyCode) -> bool {
    k == KEY_DOWN || k == 'j' as KeyCode || k == 'J' as KeyCode
}

pub const fn is_left_key(k: KeyCode) -> bool {
    k == KEY_LEFT || k == 'h' as KeyCode || k == 'H' as KeyCode
}

pub const fn is_right_key(k: KeyCode) -> bool {
    k == KEY_RIGHT || k == 'l' as KeyCode || k == 'L' as KeyCode
}

pub const fn is_enter_key(k: KeyCode) -> bool {
    k == '\n' as KeyCode || k == '\r' as KeyCode
}

pub const fn is_save_key(k: KeyCode) -> bool {
    k == CTRL_S
}

pub const fn is_end_of_file_key(k: KeyCode) -> bool {
    k == 'g' as KeyCode || k == 'G' as KeyCode
}

pub const fn is_page_down_key(k: KeyCode) -> bool {
    k == KEY_PAGE_DOWN
}

pub const fn is_page_up_key(k: KeyCode) -> bool {
    k == KEY_PAGE_UP
}

pub const fn is_end_key(k: KeyCode) -> bool {
    k == KEY_END
}

pub const fn is_home_key(k: KeyCode) -> bool {
    k == KEY_HOME
}

pub const fn is_undo_key(k: KeyCode) -> bool {
    k == 'u' as KeyCode || k == 'U' as KeyCode || k == CTRL_Z
}

pub const fn is_redo_key(k: KeyCode) -> bool {
    k == 'r' as KeyCode || k == 'R' as KeyCode || k == CTRL_Y
}

pub fn is_hex_digit_key(k: KeyCode) -> bool {
    u8::try_from(k).is_ok_and(|b| (b as char).is_ascii_hexdigit())
}
