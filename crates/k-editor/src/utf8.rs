//! Codepoint navigation over raw UTF-8 bytes.
//!
//! Rows store bytes, not `String`s: a file may contain invalid UTF-8 and
//! the editor must still open, display and save it unchanged. These helpers
//! find glyph boundaries and estimate display width directly on `&[u8]`.
//!
//! None of them fail. Out-of-range positions are clamped, and malformed
//! lead bytes count as one-byte glyphs so every traversal makes progress.
//!
//! # Width
//!
//! Width is a two-bucket heuristic, not a Unicode East Asian Width lookup:
//! three-byte sequences (which cover CJK ideographs, kana and hangul) are
//! two columns wide, everything else is one.

/// `true` if `b` is a UTF-8 continuation byte (`10xxxxxx`).
#[inline]
#[must_use]
pub const fn is_continuation_byte(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Smallest index `> pos` that is not a continuation byte, capped at `len`.
///
/// `len` is itself clamped to `bytes.len()`. Stepping from `pos >= len`
/// returns `len`.
#[must_use]
pub fn next_boundary(bytes: &[u8], pos: usize, len: usize) -> usize {
    let len = len.min(bytes.len());
    if pos >= len {
        return len;
    }
    let mut next = pos + 1;
    while next < len && is_continuation_byte(bytes[next]) {
        next += 1;
    }
    next
}

/// Largest index `< pos` that is not a continuation byte, floored at 0.
///
/// A `pos` past the end is treated as `bytes.len()`.
#[must_use]
pub fn prev_boundary(bytes: &[u8], pos: usize) -> usize {
    let mut prev = pos.min(bytes.len());
    if prev == 0 {
        return 0;
    }
    prev -= 1;
    while prev > 0 && is_continuation_byte(bytes[prev]) {
        prev -= 1;
    }
    prev
}

/// Display width of the glyph whose lead byte is at `pos`.
///
/// ASCII is 1, a three-byte lead is 2, any other lead (two- and four-byte
/// sequences, stray continuation bytes) is 1. Past the end there is no
/// glyph, so the width is 0.
#[must_use]
pub fn display_width(bytes: &[u8], pos: usize) -> usize {
    match bytes.get(pos) {
        None => 0,
        Some(&b) if b & 0xF0 == 0xE0 => 2,
        Some(_) => 1,
    }
}

/// Encoded length of the sequence introduced by `lead`.
///
/// Returns 1 for ASCII and for anything that is not a valid lead byte
/// (continuation bytes, `0xF8..=0xFF`).
#[inline]
#[must_use]
pub const fn encoded_length(lead: u8) -> usize {
    if lead & 0x80 == 0x00 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}
