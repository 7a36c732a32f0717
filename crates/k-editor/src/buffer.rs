//! Text buffer — the row array, its syntax, and file I/O.
//!
//! A `Buffer` is an ordered list of [`Row`]s plus the metadata every row
//! operation needs: the tab stop, the active [`Syntax`], the file path, and
//! a dirty counter.
//!
//! # Highlight consistency
//!
//! Every mutation goes through a single funnel: rebuild the row's render,
//! then rehighlight it with the previous row's comment carry. If the row's
//! own carry changed, the next row is rehighlighted too, and so on down the
//! buffer until a row's carry stays put. The cascade is a loop, so opening
//! a block comment at the top of a large file cannot overflow the stack.
//!
//! Row insertion and deletion keep the cascade honest: a new row starts
//! with the carry its successor was last highlighted with, and deleting a
//! row rehighlights the successor when its incoming carry changes.
//!
//! # Indices
//!
//! Row and byte indices are validated. Inserting at `len` appends;
//! anything further out is clamped (insertion) or ignored (deletion).
//! Byte offsets are not checked against glyph boundaries; the editor only
//! passes boundaries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::highlight::Highlight;
use crate::row::Row;
use crate::syntax::{self, Syntax};

/// An ordered list of rows backed by an optional file.
#[derive(Debug, Clone)]
pub struct Buffer {
    rows: Vec<Row>,
    syntax: Option<&'static Syntax>,
    tab_stop: usize,
    path: Option<PathBuf>,
    /// Number of edits since the last load or save. Zero means clean.
    dirty: usize,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An empty, clean buffer with no path and no syntax.
    #[must_use]
    pub fn new(tab_stop: usize) -> Self {
        Self {
            rows: Vec::new(),
            syntax: None,
            tab_stop: tab_stop.max(1),
            path: None,
            dirty: 0,
        }
    }

    /// A clean buffer holding `lines`, one row each.
    #[must_use]
    pub fn from_lines<I, L>(lines: I, tab_stop: usize) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let mut buffer = Self::new(tab_stop);
        buffer.rows = lines
            .into_iter()
            .map(|line| Row::new(line, buffer.tab_stop))
            .collect();
        buffer.rehighlight_all();
        buffer
    }

    /// Load `path`, selecting a syntax from `tables` by filename.
    ///
    /// Lines are split on `\n`; trailing `\r` bytes are stripped. A file
    /// that does not exist yields an empty buffer carrying the path, so the
    /// first save creates it.
    ///
    /// # Errors
    ///
    /// Returns any read error other than "not found".
    pub fn open(path: &Path, tab_stop: usize, tables: &'static [Syntax]) -> io::Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "new file");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let mut buffer = Self::from_lines(split_lines(&bytes), tab_stop);
        buffer.path = Some(path.to_path_buf());
        buffer.select_syntax(tables);
        info!(
            path = %path.display(),
            rows = buffer.len(),
            filetype = buffer.filetype(),
            "opened"
        );
        Ok(buffer)
    }

    // -- Row access ---------------------------------------------------------

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn row(&self, at: usize) -> Option<&Row> {
        self.rows.get(at)
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Length in bytes of row `at`, or 0 past the end.
    #[must_use]
    pub fn row_len(&self, at: usize) -> usize {
        self.rows.get(at).map_or(0, Row::len)
    }

    /// Rows joined by `\n`, each row followed by one.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let total = self.rows.iter().map(|r| r.len() + 1).sum();
        let mut out = Vec::with_capacity(total);
        for row in &self.rows {
            out.extend_from_slice(row.raw());
            out.push(b'\n');
        }
        out
    }

    // -- Metadata -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn tab_stop(&self) -> usize {
        self.tab_stop
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set the file path and reselect the syntax from `tables`.
    pub fn set_path(&mut self, path: PathBuf, tables: &'static [Syntax]) {
        self.path = Some(path);
        self.select_syntax(tables);
    }

    #[inline]
    #[must_use]
    pub const fn syntax(&self) -> Option<&'static Syntax> {
        self.syntax
    }

    /// Filetype name of the active syntax.
    #[must_use]
    pub fn filetype(&self) -> Option<&'static str> {
        self.syntax.map(|s| s.filetype)
    }

    /// Pick the syntax for the current path and rehighlight every row.
    pub fn select_syntax(&mut self, tables: &'static [Syntax]) {
        let selected = self
            .path
            .as_deref()
            .and_then(Path::to_str)
            .and_then(|name| syntax::select(tables, name));
        self.set_syntax(selected);
    }

    /// Replace the syntax and rehighlight every row.
    pub fn set_syntax(&mut self, syntax: Option<&'static Syntax>) {
        self.syntax = syntax;
        debug!(filetype = self.filetype(), "syntax selected");
        self.rehighlight_all();
    }

    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty > 0
    }

    /// Edits since the last load or save.
    #[inline]
    #[must_use]
    pub const fn dirty_count(&self) -> usize {
        self.dirty
    }

    // -- Row mutation -------------------------------------------------------

    /// Insert a row holding `bytes` before row `at`. `at == len` appends;
    /// larger values are clamped to `len`.
    pub fn insert_row(&mut self, at: usize, bytes: impl Into<Vec<u8>>) {
        let at = at.min(self.rows.len());
        let mut row = Row::new(bytes, self.tab_stop);
        row.set_comment_carry(self.carry_into(at));
        self.rows.insert(at, row);
        self.dirty += 1;
        self.rehighlight_from(at);
    }

    /// Remove row `at`. Out of range is a no-op.
    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }
        let removed = self.rows.remove(at);
        self.dirty += 1;
        if at < self.rows.len() && self.carry_into(at) != removed.comment_carry() {
            self.rehighlight_from(at);
        }
    }

    /// Insert one byte into row `row` at byte offset `at` (clamped to the
    /// row length).
    pub fn insert_byte(&mut self, row: usize, at: usize, byte: u8) {
        self.insert_bytes(row, at, &[byte]);
    }

    /// Insert `bytes` into row `row` at byte offset `at` (clamped).
    pub fn insert_bytes(&mut self, row: usize, at: usize, bytes: &[u8]) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        let raw = target.raw_mut();
        let at = at.min(raw.len());
        raw.splice(at..at, bytes.iter().copied());
        self.dirty += 1;
        self.update_row(row);
    }

    /// Append `bytes` to the end of row `row`.
    pub fn append_bytes(&mut self, row: usize, bytes: &[u8]) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        target.raw_mut().extend_from_slice(bytes);
        self.dirty += 1;
        self.update_row(row);
    }

    /// Remove the byte at offset `at` of row `row`. Out of range is a no-op.
    pub fn delete_byte(&mut self, row: usize, at: usize) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        if at >= target.len() {
            return;
        }
        target.raw_mut().remove(at);
        self.dirty += 1;
        self.update_row(row);
    }

    /// Split row `row` at byte offset `at`: the tail moves to a new row
    /// inserted right after it.
    pub fn split_row(&mut self, row: usize, at: usize) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        let at = at.min(target.len());
        let tail = target.raw_mut().split_off(at);
        self.update_row(row);
        self.insert_row(row + 1, tail);
    }

    /// Append row `row` to the previous row and delete it. Returns the byte
    /// offset in the previous row where the join happened, or `None` when
    /// there is no previous row.
    pub fn join_with_previous(&mut self, row: usize) -> Option<usize> {
        if row == 0 || row >= self.rows.len() {
            return None;
        }
        let joint = self.rows[row - 1].len();
        let moved = self.rows[row].raw().to_vec();
        self.append_bytes(row - 1, &moved);
        self.delete_row(row);
        Some(joint)
    }

    // -- Highlight overlay --------------------------------------------------

    /// Paint `hl` over rendered byte range `range` of row `row`, clamped to
    /// the rendered length.
    pub fn paint_highlight(&mut self, row: usize, range: std::ops::Range<usize>, hl: Highlight) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        let highlight = target.highlight_mut();
        let end = range.end.min(highlight.len());
        let start = range.start.min(end);
        highlight[start..end].fill(hl);
    }

    /// Put back a highlight array taken from row `row` with
    /// [`Row::highlight`]. Refused (returns `false`) when the row no longer
    /// exists or its rendered length changed.
    pub fn restore_highlight(&mut self, row: usize, saved: Vec<Highlight>) -> bool {
        match self.rows.get_mut(row) {
            Some(target) if target.highlight().len() == saved.len() => {
                *target.highlight_mut() = saved;
                true
            }
            _ => false,
        }
    }

    // -- File I/O -----------------------------------------------------------

    /// Write the buffer to its path, creating or truncating the file.
    /// Returns the number of bytes written and marks the buffer clean.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is set or the write fails.
    pub fn save(&mut self) -> io::Result<usize> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "buffer has no file path"))?;
        let bytes = self.to_bytes();
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved");
        self.dirty = 0;
        Ok(bytes.len())
    }

    // -- Internals ----------------------------------------------------------

    /// The comment carry row `at` should be highlighted with.
    fn carry_into(&self, at: usize) -> bool {
        at > 0 && self.rows.get(at - 1).is_some_and(Row::comment_carry)
    }

    fn update_row(&mut self, at: usize) {
        if let Some(row) = self.rows.get_mut(at) {
            row.rebuild_render(self.tab_stop);
        }
        self.rehighlight_from(at);
    }

    /// Rehighlight row `start`, then each following row for as long as the
    /// carry keeps changing.
    fn rehighlight_from(&mut self, start: usize) {
        let mut at = start;
        while at < self.rows.len() {
            let carry_in = self.carry_into(at);
            if !self.rows[at].rehighlight(self.syntax, carry_in) {
                break;
            }
            at += 1;
        }
        if at > start {
            trace!(start, end = at, "carry cascade");
        }
    }

    fn rehighlight_all(&mut self) {
        let mut carry = false;
        for row in &mut self.rows {
            row.rehighlight(self.syntax, carry);
            carry = row.comment_carry();
        }
    }
}

/// Split file contents into lines without their `\n` or trailing `\r`s.
/// A final newline does not start an extra empty line.
fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|&b| b == b'\n')
        .map(|line| {
            let end = line.iter().rposition(|&b| b != b'\r').map_or(0, |i| i + 1);
            &line[..end]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::BUILTIN;
    use pretty_assertions::assert_eq;

    use Highlight::{Keyword2 as K2, MlComment as Ml, Normal as N};

    fn c_buffer(lines: &[&str]) -> Buffer {
        let mut buf = Buffer::from_lines(lines.iter().copied(), 8);
        buf.set_syntax(syntax::select(BUILTIN, "x.c"));
        buf
    }

    fn raw(buf: &Buffer, at: usize) -> &str {
        std::str::from_utf8(buf.row(at).unwrap().raw()).unwrap()
    }

    fn carries(buf: &Buffer) -> Vec<bool> {
        buf.rows().iter().map(Row::comment_carry).collect()
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("k_editor_buffer_test");
        let _ = fs::create_dir_all(&dir);
        dir.join(name)
    }

    // -- construction -------------------------------------------------------

    #[test]
    fn from_lines_is_clean() {
        let buf = Buffer::from_lines(["a", "b"], 8);
        assert_eq!(buf.len(), 2);
        assert!(!buf.is_dirty());
        assert_eq!(buf.to_bytes(), b"a\nb\n");
    }

    #[test]
    fn split_lines_strips_cr_and_final_newline() {
        assert_eq!(split_lines(b"a\r\nb\n"), vec![&b"a"[..], b"b"]);
        assert_eq!(split_lines(b"a\n\nb"), vec![&b"a"[..], b"", b"b"]);
        assert_eq!(split_lines(b"\n"), vec![&b""[..]]);
        assert!(split_lines(b"").is_empty());
    }

    // -- row mutation -------------------------------------------------------

    #[test]
    fn insert_row_at_len_appends_and_clamps() {
        let mut buf = Buffer::from_lines(["a"], 8);
        buf.insert_row(1, "b");
        buf.insert_row(99, "c");
        assert_eq!(buf.to_bytes(), b"a\nb\nc\n");
        assert_eq!(buf.dirty_count(), 2);
    }

    #[test]
    fn delete_row_out_of_range_is_noop() {
        let mut buf = Buffer::from_lines(["a"], 8);
        buf.delete_row(1);
        assert_eq!(buf.len(), 1);
        assert!(!buf.is_dirty());
        buf.delete_row(0);
        assert!(buf.is_empty());
        assert!(buf.is_dirty());
    }

    #[test]
    fn insert_and_delete_bytes() {
        let mut buf = Buffer::from_lines(["ac"], 8);
        buf.insert_byte(0, 1, b'b');
        buf.insert_byte(0, 99, b'd');
        assert_eq!(raw(&buf, 0), "abcd");
        buf.delete_byte(0, 0);
        buf.delete_byte(0, 99);
        assert_eq!(raw(&buf, 0), "bcd");
    }

    #[test]
    fn insert_bytes_rerenders() {
        let mut buf = Buffer::from_lines(["x"], 4);
        buf.insert_bytes(0, 0, b"\t");
        assert_eq!(buf.row(0).unwrap().rendered(), b"    x");
    }

    #[test]
    fn mutation_of_missing_row_is_noop() {
        let mut buf = Buffer::new(8);
        buf.insert_byte(0, 0, b'a');
        buf.append_bytes(3, b"a");
        buf.delete_byte(0, 0);
        assert!(buf.is_empty());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn split_and_join_are_inverse() {
        let mut buf = Buffer::from_lines(["hello world"], 8);
        buf.split_row(0, 5);
        assert_eq!(raw(&buf, 0), "hello");
        assert_eq!(raw(&buf, 1), " world");
        assert_eq!(buf.join_with_previous(1), Some(5));
        assert_eq!(buf.len(), 1);
        assert_eq!(raw(&buf, 0), "hello world");
    }

    #[test]
    fn join_first_row_is_none() {
        let mut buf = Buffer::from_lines(["a", "b"], 8);
        assert_eq!(buf.join_with_previous(0), None);
        assert_eq!(buf.join_with_previous(2), None);
        assert_eq!(buf.len(), 2);
    }

    // -- highlight cascade --------------------------------------------------

    #[test]
    fn opening_comment_cascades_down() {
        let mut buf = c_buffer(&["x", "int a;", "int b;"]);
        assert_eq!(buf.row(1).unwrap().highlight()[0], K2);

        buf.insert_bytes(0, 0, b"/* ");
        assert_eq!(carries(&buf), vec![true, true, true]);
        assert!(buf.row(1).unwrap().highlight().iter().all(|&h| h == Ml));
        assert!(buf.row(2).unwrap().highlight().iter().all(|&h| h == Ml));
    }

    #[test]
    fn closing_comment_cascades_down() {
        let mut buf = c_buffer(&["/* x", "int a;", "int b;"]);
        assert_eq!(carries(&buf), vec![true, true, true]);

        buf.append_bytes(0, b" */");
        assert_eq!(carries(&buf), vec![false, false, false]);
        assert_eq!(buf.row(2).unwrap().highlight()[..3].to_vec(), vec![K2, K2, K2]);
    }

    #[test]
    fn cascade_stops_at_closing_row() {
        let mut buf = c_buffer(&["x", "a */", "int b;"]);
        buf.insert_bytes(0, 0, b"/*");
        assert_eq!(carries(&buf), vec![true, false, false]);
        assert_eq!(buf.row(2).unwrap().highlight()[0], K2);
    }

    #[test]
    fn inserted_row_inside_comment_inherits_carry() {
        let mut buf = c_buffer(&["/* a", "b */", "int c;"]);
        buf.insert_row(1, "mid");
        assert_eq!(carries(&buf), vec![true, true, false, false]);
        assert!(buf.row(1).unwrap().highlight().iter().all(|&h| h == Ml));
    }

    #[test]
    fn inserted_closing_row_recolors_successors() {
        let mut buf = c_buffer(&["/* a", "int c;"]);
        buf.insert_row(1, "*/");
        assert_eq!(carries(&buf), vec![true, false, false]);
        assert_eq!(buf.row(2).unwrap().highlight()[0], K2);
    }

    #[test]
    fn deleting_opener_recolors_successors() {
        let mut buf = c_buffer(&["/* a", "int c;", "int d;"]);
        buf.delete_row(0);
        assert_eq!(carries(&buf), vec![false, false]);
        assert_eq!(buf.row(0).unwrap().highlight()[0], K2);
        assert_eq!(buf.row(1).unwrap().highlight()[0], K2);
    }

    #[test]
    fn set_syntax_none_clears_highlight() {
        let mut buf = c_buffer(&["int a; /*"]);
        buf.set_syntax(None);
        assert!(buf.row(0).unwrap().highlight().iter().all(|&h| h == N));
        assert_eq!(carries(&buf), vec![false]);
    }

    // -- overlay ------------------------------------------------------------

    #[test]
    fn paint_and_restore_highlight() {
        let mut buf = c_buffer(&["int a;"]);
        let saved = buf.row(0).unwrap().highlight().to_vec();
        buf.paint_highlight(0, 4..99, Highlight::Match);
        assert_eq!(buf.row(0).unwrap().highlight()[4..].to_vec(), vec![Highlight::Match; 2]);
        assert!(buf.restore_highlight(0, saved.clone()));
        assert_eq!(buf.row(0).unwrap().highlight().to_vec(), saved);
    }

    #[test]
    fn restore_refused_after_length_change() {
        let mut buf = c_buffer(&["int a;"]);
        let saved = buf.row(0).unwrap().highlight().to_vec();
        buf.append_bytes(0, b"x");
        assert!(!buf.restore_highlight(0, saved.clone()));
        assert!(!buf.restore_highlight(5, saved));
    }

    // -- file I/O -----------------------------------------------------------

    #[test]
    fn save_and_open_roundtrip() {
        let path = temp_path("roundtrip.c");
        let mut buf = Buffer::from_lines(["int main;", "\treturn 0;"], 8);
        buf.set_path(path.clone(), BUILTIN);
        assert_eq!(buf.filetype(), Some("c"));
        buf.insert_row(2, "}");
        assert!(buf.is_dirty());

        let written = buf.save().unwrap();
        assert_eq!(written, "int main;\n\treturn 0;\n}\n".len());
        assert!(!buf.is_dirty());

        let loaded = Buffer::open(&path, 8, BUILTIN).unwrap();
        assert_eq!(loaded.to_bytes(), buf.to_bytes());
        assert_eq!(loaded.filetype(), Some("c"));
        assert!(!loaded.is_dirty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn open_missing_file_is_empty_with_path() {
        let path = temp_path("does-not-exist.py");
        let _ = fs::remove_file(&path);
        let buf = Buffer::open(&path, 8, BUILTIN).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.path(), Some(path.as_path()));
        assert_eq!(buf.filetype(), Some("python"));
    }

    #[test]
    fn open_keeps_invalid_utf8() {
        let path = temp_path("latin1.txt");
        fs::write(&path, b"caf\xe9\r\n").unwrap();
        let buf = Buffer::open(&path, 8, BUILTIN).unwrap();
        assert_eq!(buf.row(0).unwrap().raw(), b"caf\xe9");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_without_path_errors() {
        let mut buf = Buffer::from_lines(["a"], 8);
        let err = buf.save().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
