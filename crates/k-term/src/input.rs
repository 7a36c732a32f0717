// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns raw stdin bytes into logical keys. Only the handful of sequences an
// editor actually needs are recognized:
//
// - Letter-coded CSI: `ESC [ A..D` (arrows), `ESC [ H` / `ESC [ F`
// - Numeric `~`-terminated CSI: `ESC [ 1~ .. 8~` (Home, Delete, End,
//   Page Up, Page Down, and the rxvt Home/End variants 7~ / 8~)
// - SS3: `ESC O H` / `ESC O F` (Home/End from some xterm modes)
//
// Anything else that starts with ESC (an unknown final byte, a sequence
// cut short by the read timeout) decodes to a bare `Escape`. A stray byte
// never produces an error.
//
// # Design
//
// The decoder does not own the byte stream. It receives the first byte and
// a `next` closure that yields the following bytes (or `None` when the
// read timed out). The terminal feeds it from stdin; tests feed it from a
// slice. Bytes ≥ 0x80 are passed through untouched as `Key::Char`; the
// caller assembles them into complete UTF-8 sequences.

/// Escape byte (0x1B).
pub const ESC: u8 = 0x1B;

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A literal byte: printable ASCII, a control character, or one byte
    /// of a multi-byte UTF-8 sequence.
    Char(u8),
    /// A lone Escape, or an escape sequence we don't recognize.
    Escape,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Editing ─────────────────────────────────────────────────
    Delete,
}

impl Key {
    /// Enter arrives as a carriage return in raw mode.
    pub const ENTER: Self = Self::Char(b'\r');
    /// Backspace arrives as DEL (0x7F) on virtually every terminal.
    pub const BACKSPACE: Self = Self::Char(0x7F);

    /// The key produced by holding Ctrl with `letter` (`ctrl(b'q')` = 0x11).
    #[inline]
    #[must_use]
    pub const fn ctrl(letter: u8) -> Self {
        Self::Char(letter & 0x1F)
    }

    /// Whether this is a literal byte in the ASCII control range.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Char(b) if b < 0x20 || b == 0x7F)
    }

    /// Whether this is an arrow key.
    #[inline]
    #[must_use]
    pub const fn is_arrow(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

/// Decode one key given its first byte.
///
/// `next` supplies follow-up bytes and returns `None` when no byte arrived
/// within the read timeout. At most three follow-up bytes are consumed.
///
/// ```
/// use k_term::input::{decode_key, Key, ESC};
///
/// let mut rest = b"[A".iter().copied();
/// assert_eq!(decode_key(ESC, || rest.next()), Key::Up);
/// ```
pub fn decode_key(first: u8, mut next: impl FnMut() -> Option<u8>) -> Key {
    if first != ESC {
        return Key::Char(first);
    }

    let Some(intro) = next() else {
        return Key::Escape;
    };
    let Some(code) = next() else {
        return Key::Escape;
    };

    match intro {
        b'[' if code.is_ascii_digit() => match next() {
            Some(b'~') => tilde_key(code),
            _ => Key::Escape,
        },
        b'[' => letter_key(code),
        b'O' => match code {
            b'H' => Key::Home,
            b'F' => Key::End,
            _ => Key::Escape,
        },
        _ => Key::Escape,
    }
}

/// `ESC [ <letter>` family.
const fn letter_key(code: u8) -> Key {
    match code {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Escape,
    }
}

/// `ESC [ <digit> ~` family.
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'3' => Key::Delete,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Escape,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
