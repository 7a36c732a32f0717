//! The editor context — buffer, cursor, scroll state and key dispatch.
//!
//! [`Editor`] is the single owner of everything that changes while the
//! editor runs. Nothing is global: the prompt, the search session and the
//! view all take the context explicitly.
//!
//! # Coordinates
//!
//! - `cx`: byte offset into the current row's raw bytes, always on a glyph
//!   boundary and never past the row length
//! - `cy`: row index, `0..=buffer.len()` (the row just past the end is the
//!   virtual line new text is appended to)
//! - `rx`: display column of `cx`, recomputed by [`Editor::scroll`]
//!
//! # I/O
//!
//! Operations that may need more input (saving an unnamed buffer, search)
//! take a [`KeySource`] and a screen writer. The host passes the terminal
//! and stdout; tests pass a scripted key source and a `Vec<u8>`.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use k_term::{Key, KeySource, OutputBuffer, Size};
use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::config::Settings;
use crate::syntax::{self, Syntax};
use crate::utf8::{encoded_length, is_continuation_byte, next_boundary, prev_boundary};

/// Rows reserved below the text area (status bar, message bar).
pub const RESERVED_ROWS: usize = 2;

/// Message shown at startup.
pub const HELP_MESSAGE: &str = "HELP: Ctrl-s = save | Ctrl-q = quit | Ctrl-f = find";

/// What the host should do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

#[derive(Debug, Clone)]
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) set_at: Instant,
}

/// All mutable editor state.
#[derive(Debug)]
pub struct Editor {
    pub(crate) buffer: Buffer,
    pub(crate) settings: Settings,
    pub(crate) syntaxes: &'static [Syntax],
    pub(crate) cx: usize,
    pub(crate) cy: usize,
    pub(crate) rx: usize,
    pub(crate) row_offset: usize,
    pub(crate) col_offset: usize,
    /// Text rows, excluding the status and message bars.
    pub(crate) screen_rows: usize,
    pub(crate) screen_cols: usize,
    pub(crate) status: Option<StatusMessage>,
    quit_times: usize,
    /// Lead and continuation bytes of a UTF-8 sequence still arriving.
    pending: Vec<u8>,
    pub(crate) frame: OutputBuffer,
}

impl Editor {
    // -- Construction -------------------------------------------------------

    /// An editor with an empty buffer sized for a terminal of `size`.
    #[must_use]
    pub fn new(settings: Settings, size: Size) -> Self {
        let mut editor = Self {
            buffer: Buffer::new(settings.tab_stop),
            quit_times: settings.quit_times,
            settings,
            syntaxes: syntax::BUILTIN,
            cx: 0,
            cy: 0,
            rx: 0,
            row_offset: 0,
            col_offset: 0,
            screen_rows: 0,
            screen_cols: 0,
            status: None,
            pending: Vec::new(),
            frame: OutputBuffer::new(),
        };
        editor.resize(size);
        editor
    }

    /// Use `tables` instead of the built-in syntax tables.
    #[must_use]
    pub fn with_syntaxes(mut self, tables: &'static [Syntax]) -> Self {
        self.syntaxes = tables;
        self.buffer.select_syntax(tables);
        self
    }

    /// Replace the buffer and reset the cursor.
    pub fn set_buffer(&mut self, buffer: Buffer) {
        self.buffer = buffer;
        self.cx = 0;
        self.cy = 0;
        self.rx = 0;
        self.row_offset = 0;
        self.col_offset = 0;
    }

    /// Load `path` into the editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> std::io::Result<()> {
        let path = path.into();
        let buffer = Buffer::open(&path, self.settings.tab_stop, self.syntaxes)?;
        self.set_buffer(buffer);
        Ok(())
    }

    /// Adapt to a new terminal size.
    pub fn resize(&mut self, size: Size) {
        self.screen_rows = usize::from(size.rows).saturating_sub(RESERVED_ROWS);
        self.screen_cols = usize::from(size.cols);
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// `(cx, cy)`: byte offset and row.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.cx, self.cy)
    }

    /// Display column of the cursor as of the last [`scroll`](Self::scroll).
    #[inline]
    #[must_use]
    pub const fn render_column(&self) -> usize {
        self.rx
    }

    /// `(row_offset, col_offset)`.
    #[inline]
    #[must_use]
    pub const fn scroll_offsets(&self) -> (usize, usize) {
        (self.row_offset, self.col_offset)
    }

    /// The current status message, regardless of age.
    #[must_use]
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    /// Set the message bar text. An empty message clears it.
    pub fn set_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.status = (!text.is_empty()).then(|| StatusMessage {
            text,
            set_at: Instant::now(),
        });
    }

    // -- Editing ------------------------------------------------------------

    /// Feed one typed byte. Multi-byte UTF-8 sequences are held until
    /// complete and then inserted together.
    pub fn insert_key_byte(&mut self, byte: u8) {
        if !self.pending.is_empty() {
            if is_continuation_byte(byte) {
                self.pending.push(byte);
                if self.pending.len() >= encoded_length(self.pending[0]) {
                    self.flush_pending();
                }
                return;
            }
            self.flush_pending();
        }
        if encoded_length(byte) > 1 {
            self.pending.push(byte);
        } else {
            self.insert_bytes(&[byte]);
        }
    }

    /// Insert whatever is pending, complete or not.
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let glyph = std::mem::take(&mut self.pending);
        self.insert_bytes(&glyph);
    }

    /// Insert `bytes` at the cursor and advance past them.
    pub fn insert_bytes(&mut self, bytes: &[u8]) {
        if self.cy == self.buffer.len() {
            self.buffer.insert_row(self.cy, Vec::new());
        }
        self.buffer.insert_bytes(self.cy, self.cx, bytes);
        self.cx += bytes.len();
    }

    /// Break the line at the cursor.
    pub fn insert_newline(&mut self) {
        if self.cx == 0 {
            self.buffer.insert_row(self.cy, Vec::new());
        } else {
            self.buffer.split_row(self.cy, self.cx);
        }
        self.cy += 1;
        self.cx = 0;
    }

    /// Delete the glyph before the cursor, joining lines at column 0.
    pub fn delete_char(&mut self) {
        if self.cy >= self.buffer.len() || (self.cx == 0 && self.cy == 0) {
            return;
        }
        if self.cx > 0 {
            let Some(row) = self.buffer.row(self.cy) else {
                return;
            };
            let start = prev_boundary(row.raw(), self.cx);
            for _ in start..self.cx {
                self.buffer.delete_byte(self.cy, start);
            }
            self.cx = start;
        } else if let Some(joint) = self.buffer.join_with_previous(self.cy) {
            self.cy -= 1;
            self.cx = joint;
        }
    }

    // -- Movement -----------------------------------------------------------

    /// Move the cursor for an arrow key; other keys are ignored.
    pub fn move_cursor(&mut self, key: Key) {
        let tab_stop = self.settings.tab_stop;
        match key {
            Key::Left => {
                if self.cx > 0 {
                    let raw = self.buffer.row(self.cy).map_or(&[][..], |r| r.raw());
                    self.cx = prev_boundary(raw, self.cx);
                } else if self.cy > 0 {
                    self.cy -= 1;
                    self.cx = self.buffer.row_len(self.cy);
                }
            }
            Key::Right => {
                if let Some(row) = self.buffer.row(self.cy) {
                    if self.cx < row.len() {
                        self.cx = next_boundary(row.raw(), self.cx, row.len());
                    } else {
                        self.cy += 1;
                        self.cx = 0;
                    }
                }
            }
            Key::Up | Key::Down => {
                let col = self
                    .buffer
                    .row(self.cy)
                    .map_or(0, |r| r.to_display_column(self.cx, tab_stop));
                if key == Key::Up && self.cy > 0 {
                    self.cy -= 1;
                } else if key == Key::Down && self.cy < self.buffer.len() {
                    self.cy += 1;
                } else {
                    return;
                }
                self.cx = self
                    .buffer
                    .row(self.cy)
                    .map_or(0, |r| r.to_byte_offset(col, tab_stop));
            }
            _ => {}
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        self.cy = self.cy.min(self.buffer.len());
        self.cx = self.cx.min(self.buffer.row_len(self.cy));
    }

    fn page(&mut self, key: Key) {
        let (target, step) = if key == Key::PageUp {
            (self.row_offset, Key::Up)
        } else {
            let bottom = (self.row_offset + self.screen_rows).saturating_sub(1);
            (bottom.min(self.buffer.len()), Key::Down)
        };
        self.cy = target;
        self.clamp_cursor();
        for _ in 0..self.screen_rows {
            self.move_cursor(step);
        }
    }

    // -- Key dispatch -------------------------------------------------------

    /// Read one key and act on it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading a key or drawing a prompt frame fails.
    pub fn process_keypress(
        &mut self,
        keys: &mut impl KeySource,
        screen: &mut impl Write,
    ) -> k_term::Result<Outcome> {
        let key = keys.read_key()?;
        self.handle_key(key, keys, screen)
    }

    /// Act on `key`. `keys` and `screen` serve prompts the key may open.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt fails to read a key or draw a frame.
    pub fn handle_key(
        &mut self,
        key: Key,
        keys: &mut impl KeySource,
        screen: &mut impl Write,
    ) -> k_term::Result<Outcome> {
        if !self.pending.is_empty() && !matches!(key, Key::Char(b) if is_continuation_byte(b)) {
            self.flush_pending();
        }

        match key {
            Key::ENTER => self.insert_newline(),
            k if k == Key::ctrl(b'q') => {
                if self.buffer.is_dirty() && self.quit_times > 0 {
                    self.set_status(format!(
                        "WARNING!!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                        self.quit_times
                    ));
                    self.quit_times -= 1;
                    return Ok(Outcome::Continue);
                }
                debug!(dirty = self.buffer.is_dirty(), "quit");
                return Ok(Outcome::Quit);
            }
            k if k == Key::ctrl(b's') => self.save(keys, screen)?,
            k if k == Key::ctrl(b'f') => self.find(keys, screen)?,
            Key::Home => self.cx = 0,
            Key::End => self.cx = self.buffer.row_len(self.cy),
            k if k == Key::BACKSPACE || k == Key::ctrl(b'h') => self.delete_char(),
            Key::Delete => {
                self.move_cursor(Key::Right);
                self.delete_char();
            }
            Key::PageUp | Key::PageDown => self.page(key),
            Key::Up | Key::Down | Key::Left | Key::Right => self.move_cursor(key),
            Key::Escape => {}
            k if k == Key::ctrl(b'l') => {}
            Key::Char(byte) => self.insert_key_byte(byte),
        }

        self.quit_times = self.settings.quit_times;
        Ok(Outcome::Continue)
    }

    // -- Saving -------------------------------------------------------------

    /// Write the buffer, prompting for a filename if it has none.
    ///
    /// I/O failures are reported on the message bar, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the filename prompt fails.
    pub fn save(
        &mut self,
        keys: &mut impl KeySource,
        screen: &mut impl Write,
    ) -> k_term::Result<()> {
        if self.buffer.path().is_none() {
            let answer = self.prompt(
                keys,
                screen,
                |input| format!("Save as: {input} (ESC to cancel)"),
                None,
            )?;
            let Some(name) = answer else {
                self.set_status("Save aborted");
                return Ok(());
            };
            let name = String::from_utf8_lossy(&name).into_owned();
            self.buffer.set_path(PathBuf::from(name), self.syntaxes);
        }

        match self.buffer.save() {
            Ok(written) => self.set_status(format!("{written} bytes written to disk")),
            Err(err) => {
                warn!(%err, "save failed");
                self.set_status(format!("Can't save! I/O error: {err}"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{editor_with, press, ScriptedKeys};
    use pretty_assertions::assert_eq;

    fn text(editor: &Editor) -> String {
        String::from_utf8(editor.buffer().to_bytes()).unwrap()
    }

    // -- insertion ----------------------------------------------------------

    #[test]
    fn typing_into_empty_buffer_appends_row() {
        let mut ed = editor_with(&[]);
        press(&mut ed, &[Key::Char(b'h'), Key::Char(b'i')]);
        assert_eq!(text(&ed), "hi\n");
        assert_eq!(ed.cursor(), (2, 0));
        assert!(ed.buffer().is_dirty());
    }

    #[test]
    fn multibyte_sequence_inserted_whole() {
        let mut ed = editor_with(&[]);
        let keys: Vec<Key> = "あa".bytes().map(Key::Char).collect();
        press(&mut ed, &keys[..1]);
        assert!(ed.buffer().is_empty());
        press(&mut ed, &keys[1..]);
        assert_eq!(text(&ed), "あa\n");
        assert_eq!(ed.cursor(), (4, 0));
    }

    #[test]
    fn truncated_sequence_is_flushed_by_next_key() {
        let mut ed = editor_with(&[]);
        press(&mut ed, &[Key::Char(0xE3), Key::Char(b'x')]);
        assert_eq!(ed.buffer().to_bytes(), b"\xE3x\n");
        assert_eq!(ed.cursor(), (2, 0));
    }

    #[test]
    fn stray_continuation_byte_inserted_alone() {
        let mut ed = editor_with(&[]);
        press(&mut ed, &[Key::Char(0x81)]);
        assert_eq!(ed.buffer().to_bytes(), b"\x81\n");
    }

    #[test]
    fn newline_at_column_zero_inserts_above() {
        let mut ed = editor_with(&["abc"]);
        press(&mut ed, &[Key::ENTER]);
        assert_eq!(text(&ed), "\nabc\n");
        assert_eq!(ed.cursor(), (0, 1));
    }

    #[test]
    fn newline_mid_row_splits() {
        let mut ed = editor_with(&["abcd"]);
        press(&mut ed, &[Key::Right, Key::Right, Key::ENTER]);
        assert_eq!(text(&ed), "ab\ncd\n");
        assert_eq!(ed.cursor(), (0, 1));
    }

    // -- deletion -----------------------------------------------------------

    #[test]
    fn backspace_deletes_whole_glyph() {
        let mut ed = editor_with(&["aあ"]);
        press(&mut ed, &[Key::End, Key::BACKSPACE]);
        assert_eq!(text(&ed), "a\n");
        assert_eq!(ed.cursor(), (1, 0));
    }

    #[test]
    fn backspace_at_column_zero_joins() {
        let mut ed = editor_with(&["ab", "cd"]);
        press(&mut ed, &[Key::Down, Key::ctrl(b'h')]);
        assert_eq!(text(&ed), "abcd\n");
        assert_eq!(ed.cursor(), (2, 0));
    }

    #[test]
    fn backspace_at_origin_is_noop() {
        let mut ed = editor_with(&["ab"]);
        press(&mut ed, &[Key::BACKSPACE]);
        assert_eq!(text(&ed), "ab\n");
        assert!(!ed.buffer().is_dirty());
    }

    #[test]
    fn delete_removes_glyph_under_cursor() {
        let mut ed = editor_with(&["あい"]);
        press(&mut ed, &[Key::Delete]);
        assert_eq!(text(&ed), "い\n");
        assert_eq!(ed.cursor(), (0, 0));
    }

    // -- movement -----------------------------------------------------------

    #[test]
    fn left_right_step_by_glyph_and_wrap() {
        let mut ed = editor_with(&["あb", "c"]);
        press(&mut ed, &[Key::Right]);
        assert_eq!(ed.cursor(), (3, 0));
        press(&mut ed, &[Key::Right, Key::Right]);
        assert_eq!(ed.cursor(), (0, 1));
        press(&mut ed, &[Key::Left]);
        assert_eq!(ed.cursor(), (4, 0));
        press(&mut ed, &[Key::Left, Key::Left]);
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn right_on_last_row_reaches_virtual_row() {
        let mut ed = editor_with(&["a"]);
        press(&mut ed, &[Key::End, Key::Right, Key::Right]);
        assert_eq!(ed.cursor(), (0, 1));
    }

    #[test]
    fn vertical_movement_keeps_display_column() {
        let mut ed = editor_with(&["あいう", "abcdef", "x"]);
        press(&mut ed, &[Key::Right, Key::Right, Key::Down]);
        // Column 4 on "abcdef" is byte 4.
        assert_eq!(ed.cursor(), (4, 1));
        press(&mut ed, &[Key::Up]);
        assert_eq!(ed.cursor(), (6, 0));
        press(&mut ed, &[Key::Down, Key::Down]);
        // "x" is shorter: clamped to its end.
        assert_eq!(ed.cursor(), (1, 2));
    }

    #[test]
    fn vertical_movement_through_tabs() {
        let mut ed = editor_with(&["\tx", "abcdefghij"]);
        press(&mut ed, &[Key::Down, Key::End, Key::Left, Key::Left, Key::Up]);
        // Column 8 is the first cell after the tab, where "x" sits.
        assert_eq!(ed.cursor(), (1, 0));
        press(&mut ed, &[Key::Down, Key::Left, Key::Up]);
        // Column 7 is inside the tab.
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn home_and_end() {
        let mut ed = editor_with(&["hello"]);
        press(&mut ed, &[Key::End]);
        assert_eq!(ed.cursor(), (5, 0));
        press(&mut ed, &[Key::Home]);
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn page_down_and_up() {
        let lines: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut ed = editor_with(&refs);
        // 24-row terminal: 22 text rows.
        press(&mut ed, &[Key::PageDown]);
        assert_eq!(ed.cursor().1, 43);
        press(&mut ed, &[Key::PageUp]);
        assert_eq!(ed.cursor().1, 0);
    }

    // -- quitting -----------------------------------------------------------

    #[test]
    fn quit_clean_buffer_immediately() {
        let mut ed = editor_with(&["a"]);
        let mut keys = ScriptedKeys::new([]);
        let out = ed.handle_key(Key::ctrl(b'q'), &mut keys, &mut Vec::new()).unwrap();
        assert_eq!(out, Outcome::Quit);
    }

    #[test]
    fn quit_dirty_buffer_needs_confirmation() {
        let mut ed = editor_with(&[]);
        press(&mut ed, &[Key::Char(b'x')]);
        let mut keys = ScriptedKeys::new([]);
        let mut screen = Vec::new();
        for remaining in (1..=3).rev() {
            let out = ed.handle_key(Key::ctrl(b'q'), &mut keys, &mut screen).unwrap();
            assert_eq!(out, Outcome::Continue);
            assert_eq!(
                ed.status_text().unwrap(),
                format!(
                    "WARNING!!! File has unsaved changes. Press Ctrl-Q {remaining} more times to quit."
                )
            );
        }
        let out = ed.handle_key(Key::ctrl(b'q'), &mut keys, &mut screen).unwrap();
        assert_eq!(out, Outcome::Quit);
    }

    #[test]
    fn other_key_resets_quit_countdown() {
        let mut ed = editor_with(&[]);
        press(&mut ed, &[Key::Char(b'x'), Key::ctrl(b'q'), Key::ctrl(b'q'), Key::Left]);
        press(&mut ed, &[Key::ctrl(b'q')]);
        assert!(ed.status_text().unwrap().contains("Press Ctrl-Q 3 more"));
    }

    // -- saving -------------------------------------------------------------

    #[test]
    fn save_prompts_for_name() {
        let path = std::env::temp_dir().join("k_editor_save_prompt.c");
        let _ = std::fs::remove_file(&path);
        let name = path.to_str().unwrap().to_string();

        let mut ed = editor_with(&["int x;"]);
        let mut script: Vec<Key> = name.bytes().map(Key::Char).collect();
        script.push(Key::ENTER);
        let mut keys = ScriptedKeys::new(script);
        let out = ed.handle_key(Key::ctrl(b's'), &mut keys, &mut Vec::new()).unwrap();

        assert_eq!(out, Outcome::Continue);
        assert_eq!(ed.status_text(), Some("7 bytes written to disk"));
        assert_eq!(ed.buffer().filetype(), Some("c"));
        assert!(!ed.buffer().is_dirty());
        assert_eq!(std::fs::read(&path).unwrap(), b"int x;\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_prompt_escape_aborts() {
        let mut ed = editor_with(&["a"]);
        let mut keys = ScriptedKeys::new([Key::Char(b'f'), Key::Escape]);
        ed.handle_key(Key::ctrl(b's'), &mut keys, &mut Vec::new()).unwrap();
        assert_eq!(ed.status_text(), Some("Save aborted"));
        assert!(ed.buffer().path().is_none());
    }

    #[test]
    fn save_failure_reported_on_status() {
        let mut ed = editor_with(&["a"]);
        let mut buffer = Buffer::from_lines(["a"], 8);
        buffer.set_path(PathBuf::from("/nonexistent-dir/kiloe/file.txt"), &[]);
        ed.set_buffer(buffer);
        ed.handle_key(Key::ctrl(b's'), &mut ScriptedKeys::new([]), &mut Vec::new())
            .unwrap();
        assert!(ed.status_text().unwrap().starts_with("Can't save! I/O error: "));
    }

    // -- custom syntax tables -----------------------------------------------

    static CONF_SYNTAX: [Syntax; 1] = [Syntax {
        filetype: "conf",
        filematch: &[".kconf"],
        keywords: &[crate::syntax::Keyword::primary("set")],
        line_comment: Some(";"),
        block_comment: Some(("", "")),
        flags: crate::syntax::SyntaxFlags::HIGHLIGHT_NUMBERS,
    }];

    #[test]
    fn open_uses_custom_syntax_tables() {
        use crate::highlight::Highlight;

        let path = std::env::temp_dir().join("k_editor_custom_syntax.kconf");
        std::fs::write(&path, "set 4 ; note\n").unwrap();

        let mut ed = Editor::new(Settings::default(), Size { cols: 80, rows: 24 })
            .with_syntaxes(&CONF_SYNTAX);
        ed.open(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(ed.buffer().filetype(), Some("conf"));
        let row = ed.buffer().row(0).unwrap();
        assert_eq!(&row.highlight()[..3], &[Highlight::Keyword1; 3]);
        assert_eq!(row.highlight()[4], Highlight::Number);
        assert_eq!(&row.highlight()[6..], &[Highlight::Comment; 6]);
        assert!(!row.comment_carry());
    }

    // -- status -------------------------------------------------------------

    #[test]
    fn empty_status_clears() {
        let mut ed = editor_with(&[]);
        ed.set_status("hi");
        assert_eq!(ed.status_text(), Some("hi"));
        ed.set_status("");
        assert_eq!(ed.status_text(), None);
    }

    #[test]
    fn resize_reserves_two_rows() {
        let mut ed = editor_with(&[]);
        ed.resize(Size { cols: 100, rows: 40 });
        assert_eq!(ed.screen_rows, 38);
        assert_eq!(ed.screen_cols, 100);
        ed.resize(Size { cols: 1, rows: 1 });
        assert_eq!(ed.screen_rows, 0);
    }
}
