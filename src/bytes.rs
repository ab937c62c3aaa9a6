// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Byte and nibble utilities shared by the editor core and the Lua API.

/// Uppercase hex digit for a value in `0..=15`. Values above 15 are masked.
pub fn hex_char(value: u8) -> char {
    let v = value & 0x0F;
    char::from(if v > 9 { v + 55 } else { v + 48 })
}

/// Numeric value of a hex digit character, or `None` for anything else.
pub fn hex_char_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='f' => Some(c as u8 - b'a' + 10),
        'A'..='F' => Some(c as u8 - b'A' + 10),
        _ => None,
    }
}

/// Two-digit uppercase hex rendering, zero padded.
pub fn byte_to_string_padded(byte: u8) -> String {
    let mut out = String::with_capacity(2);
    out.push(hex_char(byte >> 4));
    out.push(hex_char(byte & 0x0F));
    out
}

/// Uppercase hex rendering without a leading zero.
pub fn byte_to_string(byte: u8) -> String {
    let mut out = String::with_capacity(2);
    if byte >> 4 != 0 {
        out.push(hex_char(byte >> 4));
    }
    out.push(hex_char(byte & 0x0F));
    out
}

pub fn clear_high_nibble(value: u8) -> u8 {
    value & 0x0F
}

pub fn clear_low_nibble(value: u8) -> u8 {
    value & 0xF0
}

/// Replaces the high nibble of `value` with `nibble` (masked to 4 bits).
pub fn set_high_nibble(value: u8, nibble: u8) -> u8 {
    clear_high_nibble(value) | ((nibble & 0x0F) << 4)
}

/// Replaces the low nibble of `value` with `nibble` (masked to 4 bits).
pub fn set_low_nibble(value: u8, nibble: u8) -> u8 {
    clear_low_nibble(value) | (nibble & 0x0F)
}

/// Printable ASCII, the range safe to echo into a terminal cell.
pub fn is_displayable(code: i32) -> bool {
    (32..=126).contains(&code)
}

/// True when the string contains only blank characters. Empty counts as
/// whitespace.
pub fn is_string_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\x0b' | '\x0c' | '\r'))
}
