//! View — composing one terminal frame from the editor state.
//!
//! [`Editor::refresh_screen`] builds the whole frame in the editor's
//! [`OutputBuffer`](k_term::OutputBuffer) and writes it with one call:
//!
//! ```text
//! hide cursor, home
//! ┌───────────────────────────────┐
//! │ 1 int main(void) {            │  text rows (screen_rows)
//! │ 2     return 0;               │
//! │ ~                             │
//! ├───────────────────────────────┤
//! │ main.c - 3 lines    c | 1/3   │  status bar (reverse video)
//! │ HELP: Ctrl-s = save | ...     │  message bar
//! └───────────────────────────────┘
//! position cursor, show cursor
//! ```
//!
//! Rows are drawn from their rendered bytes, clipped to the visible column
//! window by display width, with a color escape only where the highlight
//! class changes. Control bytes are shown in reverse video as `@`+n (so
//! Ctrl-A is `A`) or `?`.

use std::io::{self, Write};
use std::ops::Range;

use k_term::{ansi, OutputBuffer};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::editor::Editor;
use crate::row::Row;
use crate::utf8::{display_width, next_boundary};

/// Width of the line-number gutter: the digits of the last line number
/// plus a separator space.
///
/// | Lines   | Gutter |
/// |---------|--------|
/// | 1–9     | 2      |
/// | 10–99   | 3      |
/// | 100–999 | 4      |
///
/// Returns 0 when numbers are off or there are no lines.
#[must_use]
pub fn gutter_width(line_count: usize, show_numbers: bool) -> usize {
    if !show_numbers || line_count == 0 {
        return 0;
    }
    line_count.ilog10() as usize + 2
}

/// Byte range of `rendered` visible in the window of `width` columns
/// starting at display column `col_offset`, and the number of blank
/// columns to draw before it.
///
/// A wide glyph straddling either edge is left out. When it straddles the
/// left edge its visible half becomes the leading blank, so the glyphs
/// after it stay in their columns.
#[must_use]
pub fn visible_span(rendered: &[u8], col_offset: usize, width: usize) -> (Range<usize>, usize) {
    let len = rendered.len();
    let mut col = 0;
    let mut j = 0;
    while j < len && col < col_offset {
        col += display_width(rendered, j);
        j = next_boundary(rendered, j, len);
    }
    let start = j;
    let lead = col.saturating_sub(col_offset);
    let limit = col_offset + width;
    while j < len {
        let w = display_width(rendered, j);
        if col + w > limit {
            break;
        }
        col += w;
        j = next_boundary(rendered, j, len);
    }
    (start..j, lead)
}

/// Longest prefix of `s` at most `max` columns wide.
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut width = 0;
    for (i, ch) in s.char_indices() {
        width += ch.width().unwrap_or(0);
        if width > max {
            return &s[..i];
        }
    }
    s
}

impl Editor {
    /// Gutter width for the current buffer and settings.
    #[must_use]
    pub fn line_number_width(&self) -> usize {
        gutter_width(self.buffer.len(), self.settings.show_line_numbers)
    }

    fn text_cols(&self) -> usize {
        self.screen_cols.saturating_sub(self.line_number_width())
    }

    /// Recompute `rx` and adjust the offsets so the cursor is on screen.
    pub fn scroll(&mut self) {
        self.rx = self
            .buffer
            .row(self.cy)
            .map_or(0, |r| r.to_display_column(self.cx, self.settings.tab_stop));

        let rows = self.screen_rows.max(1);
        if self.cy < self.row_offset {
            self.row_offset = self.cy;
        }
        if self.cy >= self.row_offset + rows {
            self.row_offset = self.cy + 1 - rows;
        }

        let cols = self.text_cols().max(1);
        if self.rx < self.col_offset {
            self.col_offset = self.rx;
        }
        if self.rx >= self.col_offset + cols {
            self.col_offset = self.rx + 1 - cols;
        }
    }

    /// Scroll, compose a frame and write it to `screen` in one go.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `screen` fails.
    pub fn refresh_screen(&mut self, screen: &mut impl Write) -> io::Result<()> {
        self.scroll();

        let mut frame = std::mem::take(&mut self.frame);
        frame.clear();
        self.compose(&mut frame)?;
        let result = frame.flush_to(screen);
        self.frame = frame;
        result
    }

    fn compose(&self, out: &mut OutputBuffer) -> io::Result<()> {
        ansi::cursor_hide(out)?;
        ansi::cursor_home(out)?;
        self.draw_rows(out)?;
        self.draw_status_bar(out)?;
        self.draw_message_bar(out)?;
        let gutter = self.line_number_width();
        ansi::cursor_to(
            out,
            self.rx - self.col_offset + gutter,
            self.cy - self.row_offset,
        )?;
        ansi::cursor_show(out)
    }

    fn draw_rows(&self, out: &mut OutputBuffer) -> io::Result<()> {
        let gutter = self.line_number_width();
        let text_cols = self.text_cols();

        for y in 0..self.screen_rows {
            let file_row = y + self.row_offset;
            if let Some(row) = self.buffer.row(file_row) {
                if gutter > 0 {
                    write!(out, "{:>width$} ", file_row + 1, width = gutter - 1)?;
                }
                self.draw_row_text(out, row, text_cols)?;
            } else {
                out.push_repeated(b' ', gutter);
                if self.buffer.is_empty() && y == self.screen_rows / 3 {
                    self.draw_welcome(out);
                } else {
                    out.push(b'~');
                }
            }
            ansi::erase_line(out)?;
            out.push_bytes(b"\r\n");
        }
        Ok(())
    }

    fn draw_welcome(&self, out: &mut OutputBuffer) {
        let message = truncate_to_width(&self.settings.welcome_message, self.screen_cols);
        let mut padding = (self.screen_cols - message.width()) / 2;
        if padding > 0 {
            out.push(b'~');
            padding -= 1;
        }
        out.push_repeated(b' ', padding);
        out.push_bytes(message.as_bytes());
    }

    fn draw_row_text(&self, out: &mut OutputBuffer, row: &Row, width: usize) -> io::Result<()> {
        let rendered = row.rendered();
        let highlight = row.highlight();
        let (span, lead) = visible_span(rendered, self.col_offset, width);
        let mut color: Option<u8> = None;

        out.push_repeated(b' ', lead);
        let mut j = span.start;
        while j < span.end {
            let next = next_boundary(rendered, j, span.end);
            let byte = rendered[j];
            if byte.is_ascii_control() {
                let symbol = if byte <= 26 { b'@' + byte } else { b'?' };
                ansi::reverse(out)?;
                out.push(symbol);
                ansi::reset(out)?;
                if let Some(code) = color {
                    ansi::fg(out, code)?;
                }
            } else {
                let hl = highlight.get(j).copied().unwrap_or_default();
                let wanted = self.settings.colors.code_for(hl);
                if wanted != color {
                    match wanted {
                        Some(code) => ansi::fg(out, code)?,
                        None => ansi::fg_default(out)?,
                    }
                    color = wanted;
                }
                out.push_bytes(&rendered[j..next]);
            }
            j = next;
        }
        ansi::fg_default(out)
    }

    fn draw_status_bar(&self, out: &mut OutputBuffer) -> io::Result<()> {
        let cols = self.screen_cols;
        let name = self
            .buffer
            .path()
            .map_or_else(|| "[No Name]".to_string(), |p| p.display().to_string());
        let left = format!(
            "{} - {} lines {}",
            truncate_to_width(&name, 20),
            self.buffer.len(),
            if self.buffer.is_dirty() { "(modified)" } else { "" }
        );
        let right = format!(
            "{} | {}/{}",
            self.buffer.filetype().unwrap_or("no ft"),
            self.cy + 1,
            self.buffer.len()
        );

        ansi::reverse(out)?;
        let left = truncate_to_width(&left, cols);
        out.push_bytes(left.as_bytes());
        let mut used = left.width();
        let right_width = right.width();
        while used < cols {
            if cols - used == right_width {
                out.push_bytes(right.as_bytes());
                break;
            }
            out.push(b' ');
            used += 1;
        }
        ansi::reset(out)?;
        out.push_bytes(b"\r\n");
        Ok(())
    }

    fn draw_message_bar(&self, out: &mut OutputBuffer) -> io::Result<()> {
        ansi::erase_line(out)?;
        if let Some(status) = &self.status {
            if status.set_at.elapsed() < self.settings.status_timeout {
                out.push_bytes(truncate_to_width(&status.text, self.screen_cols).as_bytes());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
