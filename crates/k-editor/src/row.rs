//! Row model — one line of text with its rendered form and highlighting.
//!
//! A [`Row`] keeps three parallel views of a line:
//!
//! - `raw`: the bytes as they are in the file, without the newline
//! - `rendered`: `raw` with each tab expanded to spaces up to the next tab
//!   stop; every other byte copied unchanged
//! - `highlight`: one [`Highlight`] per rendered byte
//!
//! plus `comment_carry`, whether the row ends inside a block comment.
//!
//! Columns count display cells, not bytes: a three-byte glyph occupies two
//! columns (see [`utf8::display_width`](crate::utf8::display_width)).
//!
//! Rows never rehighlight themselves. The [`Buffer`](crate::buffer::Buffer)
//! owns the syntax and the row-to-row carry, so it rebuilds the render and
//! then the highlight after every mutation.

use crate::highlight::{highlight_line, Highlight};
use crate::syntax::Syntax;
use crate::utf8::{display_width, next_boundary};

/// One line of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    raw: Vec<u8>,
    rendered: Vec<u8>,
    highlight: Vec<Highlight>,
    comment_carry: bool,
}

impl Row {
    /// Build a row from raw bytes. Highlighting starts all-`Normal`.
    #[must_use]
    pub fn new(raw: impl Into<Vec<u8>>, tab_stop: usize) -> Self {
        let mut row = Self {
            raw: raw.into(),
            ..Self::default()
        };
        row.rebuild_render(tab_stop);
        row.highlight = vec![Highlight::Normal; row.rendered.len()];
        row
    }

    // -- accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn rendered(&self) -> &[u8] {
        &self.rendered
    }

    #[inline]
    #[must_use]
    pub fn highlight(&self) -> &[Highlight] {
        &self.highlight
    }

    /// Whether the row ends inside an unterminated block comment.
    #[inline]
    #[must_use]
    pub const fn comment_carry(&self) -> bool {
        self.comment_carry
    }

    /// Length of `raw` in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    // -- column conversion --------------------------------------------------

    /// Display column of raw byte offset `byte_offset`.
    ///
    /// Tabs advance to the next multiple of `tab_stop`; other glyphs advance
    /// by their display width. An offset inside a glyph maps to the column
    /// where that glyph starts. Offsets past the end are clamped.
    #[must_use]
    pub fn to_display_column(&self, byte_offset: usize, tab_stop: usize) -> usize {
        let tab_stop = tab_stop.max(1);
        let target = byte_offset.min(self.raw.len());
        let mut col = 0;
        let mut j = 0;
        while j < target {
            if self.raw[j] == b'\t' {
                col += tab_stop - col % tab_stop;
                j += 1;
                continue;
            }
            let next = next_boundary(&self.raw, j, self.raw.len());
            if next > target {
                break;
            }
            col += display_width(&self.raw, j);
            j = next;
        }
        col
    }

    /// Raw byte offset of the glyph covering display column `col`.
    ///
    /// A column inside a tab or a wide glyph maps to the start of that
    /// glyph. Columns past the end map to `len()`.
    #[must_use]
    pub fn to_byte_offset(&self, col: usize, tab_stop: usize) -> usize {
        let tab_stop = tab_stop.max(1);
        let mut cur = 0;
        let mut j = 0;
        while j < self.raw.len() {
            if self.raw[j] == b'\t' {
                cur += tab_stop - cur % tab_stop;
                if cur > col {
                    return j;
                }
                j += 1;
                continue;
            }
            cur += display_width(&self.raw, j);
            if cur > col {
                return j;
            }
            j = next_boundary(&self.raw, j, self.raw.len());
        }
        j
    }

    /// Index into `rendered` of raw byte offset `byte_offset`.
    ///
    /// Used to project a raw byte span (a search match) onto the rendered
    /// row: the span `a..b` in `raw` covers
    /// `render_offset(a)..render_offset(b)` in `rendered`.
    #[must_use]
    pub fn render_offset(&self, byte_offset: usize, tab_stop: usize) -> usize {
        let tab_stop = tab_stop.max(1);
        let target = byte_offset.min(self.raw.len());
        let mut idx = 0;
        let mut col = 0;
        let mut j = 0;
        while j < target {
            if self.raw[j] == b'\t' {
                let pad = tab_stop - col % tab_stop;
                idx += pad;
                col += pad;
                j += 1;
                continue;
            }
            let next = next_boundary(&self.raw, j, self.raw.len()).min(target);
            idx += next - j;
            col += display_width(&self.raw, j);
            j = next;
        }
        idx
    }

    // -- mutation (buffer only) ---------------------------------------------

    pub(crate) fn raw_mut(&mut self) -> &mut Vec<u8> {
        &mut self.raw
    }

    /// Recompute `rendered` from `raw`.
    ///
    /// Tab stops are measured in display columns, so a tab after a wide
    /// glyph pads less.
    pub(crate) fn rebuild_render(&mut self, tab_stop: usize) {
        let tab_stop = tab_stop.max(1);
        self.rendered.clear();
        let mut col = 0;
        let mut j = 0;
        while j < self.raw.len() {
            if self.raw[j] == b'\t' {
                let pad = tab_stop - col % tab_stop;
                self.rendered.resize(self.rendered.len() + pad, b' ');
                col += pad;
                j += 1;
                continue;
            }
            let next = next_boundary(&self.raw, j, self.raw.len());
            self.rendered.extend_from_slice(&self.raw[j..next]);
            col += display_width(&self.raw, j);
            j = next;
        }
    }

    /// Recompute `highlight` from `rendered`. Returns whether the comment
    /// carry changed.
    pub(crate) fn rehighlight(&mut self, syntax: Option<&Syntax>, carry_in: bool) -> bool {
        let carry = highlight_line(&self.rendered, syntax, carry_in, &mut self.highlight);
        let changed = carry != self.comment_carry;
        self.comment_carry = carry;
        changed
    }

    pub(crate) const fn set_comment_carry(&mut self, carry: bool) {
        self.comment_carry = carry;
    }

    pub(crate) fn highlight_mut(&mut self) -> &mut Vec<Highlight> {
        &mut self.highlight
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
