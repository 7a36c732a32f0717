//! Search — incremental find with a temporary match highlight.
//!
//! [`Editor::find`] opens a prompt and drives a [`FindSession`] from it:
//! every keystroke re-runs the search, arrow keys step to the next or
//! previous match, Enter keeps the cursor where the match is and Escape
//! puts it back.
//!
//! # Search flow
//!
//! - the first search (and any search after the query changes) starts at
//!   the cursor row, inclusive, going forward
//! - Right/Down search forward from the last match, Left/Up backward
//! - the scan wraps around both ends of the buffer and visits every row
//!   at most once
//! - within a row only the first occurrence counts
//!
//! # Match highlighting
//!
//! The matched bytes are painted [`Highlight::Match`] in the row's
//! highlight array. The previous array is saved first and put back before
//! the next search step or when the prompt closes; if the row changed
//! shape in between, the saved array is dropped instead.

use std::io::Write;

use k_term::{Key, KeySource};

use crate::buffer::Buffer;
use crate::editor::Editor;
use crate::highlight::Highlight;
use crate::prompt::PromptObserver;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A search match: row index and byte offset into the row's raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub row: usize,
    pub offset: usize,
}

/// Byte offset of the first occurrence of `needle` in `haystack`.
/// An empty needle never matches.
#[must_use]
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Scan rows starting at `start` (inclusive) in `direction`, wrapping
/// around, for the first row containing `query`.
#[must_use]
pub fn find_in_rows(
    buffer: &Buffer,
    query: &[u8],
    start: usize,
    direction: SearchDirection,
) -> Option<Match> {
    let n = buffer.len();
    if n == 0 || query.is_empty() {
        return None;
    }
    let start = start % n;
    (0..n)
        .map(|i| match direction {
            SearchDirection::Forward => (start + i) % n,
            SearchDirection::Backward => (start + n - i) % n,
        })
        .find_map(|row| {
            let raw = buffer.row(row)?.raw();
            find_subsequence(raw, query).map(|offset| Match { row, offset })
        })
}

// ---------------------------------------------------------------------------
// Match overlay
// ---------------------------------------------------------------------------

/// Saved highlight of the row currently painted with a match.
#[derive(Debug, Default)]
pub struct SearchOverlay {
    saved: Option<(usize, Vec<Highlight>)>,
}

impl SearchOverlay {
    /// Paint `len` raw bytes at `m` as a match, saving the row's highlight.
    /// Any earlier overlay is restored first.
    pub fn apply(&mut self, buffer: &mut Buffer, m: Match, len: usize) {
        self.restore(buffer);
        let tab_stop = buffer.tab_stop();
        let Some(row) = buffer.row(m.row) else {
            return;
        };
        let start = row.render_offset(m.offset, tab_stop);
        let end = row.render_offset(m.offset + len, tab_stop);
        self.saved = Some((m.row, row.highlight().to_vec()));
        buffer.paint_highlight(m.row, start..end, Highlight::Match);
    }

    /// Put the saved highlight back, if there is one and it still fits.
    pub fn restore(&mut self, buffer: &mut Buffer) {
        if let Some((row, highlight)) = self.saved.take() {
            buffer.restore_highlight(row, highlight);
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.saved.is_some()
    }
}

// ---------------------------------------------------------------------------
// FindSession
// ---------------------------------------------------------------------------

/// State of one interactive search: the last matching row, the direction
/// of the next step and the match overlay.
#[derive(Debug, Default)]
pub struct FindSession {
    last_match: Option<usize>,
    direction: SearchDirection,
    overlay: SearchOverlay,
}

impl FindSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Row of the last match, if the current query has one.
    #[must_use]
    pub const fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    #[must_use]
    pub const fn overlay(&self) -> &SearchOverlay {
        &self.overlay
    }

    /// Run one search step for `query` after `key`.
    pub fn step(&mut self, editor: &mut Editor, query: &[u8], key: Key) {
        self.overlay.restore(&mut editor.buffer);

        match key {
            Key::ENTER | Key::Escape => {
                self.last_match = None;
                self.direction = SearchDirection::Forward;
                return;
            }
            k if k.is_arrow() => {
                self.direction = if matches!(k, Key::Right | Key::Down) {
                    SearchDirection::Forward
                } else {
                    SearchDirection::Backward
                };
            }
            _ => {
                self.last_match = None;
                self.direction = SearchDirection::Forward;
            }
        }

        let n = editor.buffer.len();
        if n == 0 {
            return;
        }
        let start = match (self.last_match, self.direction) {
            (None, _) => {
                self.direction = SearchDirection::Forward;
                editor.cy
            }
            (Some(row), SearchDirection::Forward) => row + 1,
            (Some(row), SearchDirection::Backward) => row + n - 1,
        };

        let Some(m) = find_in_rows(&editor.buffer, query, start, self.direction) else {
            return;
        };
        self.last_match = Some(m.row);
        editor.cy = m.row;
        editor.cx = m.offset;
        // Pushes the match row to the top of the window on the next scroll.
        editor.row_offset = n;
        self.overlay.apply(&mut editor.buffer, m, query.len());
    }
}

impl PromptObserver for FindSession {
    fn on_key(&mut self, editor: &mut Editor, input: &[u8], key: Key) {
        self.step(editor, input, key);
    }
}

// ---------------------------------------------------------------------------
// Editor entry point
// ---------------------------------------------------------------------------

impl Editor {
    /// Interactive search. Cancelling restores the cursor and scroll.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails to read a key or draw a frame.
    pub fn find(
        &mut self,
        keys: &mut impl KeySource,
        screen: &mut impl Write,
    ) -> k_term::Result<()> {
        let saved = (self.cx, self.cy, self.col_offset, self.row_offset);
        let mut session = FindSession::new();
        let query = self.prompt(
            keys,
            screen,
            |input| format!("Search: {input} (ESC/Arrows/Enter)"),
            Some(&mut session),
        );
        session.overlay.restore(&mut self.buffer);

        if query?.is_none() {
            (self.cx, self.cy, self.col_offset, self.row_offset) = saved;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
