//! Property-based invariant tests for rows, columns and highlighting.
//!
//! These hold for any input, including invalid UTF-8:
//!
//! 1. Forward and backward boundary walks visit the same offsets.
//! 2. Byte offset → display column → byte offset lands on the glyph start.
//! 3. Rendered rows contain no tabs and carry one highlight per byte.
//! 4. Incremental rehighlighting after edits matches a full top-down pass.
//! 5. Cursor movement keeps the cursor on a glyph boundary inside its row.

use k_editor::syntax::{self, BUILTIN};
use k_editor::utf8::{is_continuation_byte, next_boundary, prev_boundary};
use k_editor::{Buffer, Editor, Row, Settings};
use k_term::{Key, Size};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Pieces that exercise tabs, wide glyphs, comments, strings and numbers.
const PIECES: &[&str] = &["/*", "*/", "//", "\"", "x", " ", "\t", "1", "int", "あ", "é"];

fn text_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(PIECES), 0..8)
        .prop_map(|parts| parts.concat().into_bytes())
}

fn boundaries_forward(bytes: &[u8]) -> Vec<usize> {
    let mut out = vec![0];
    let mut pos = 0;
    while pos < bytes.len() {
        pos = next_boundary(bytes, pos, bytes.len());
        out.push(pos);
    }
    out
}

fn boundaries_backward(bytes: &[u8]) -> Vec<usize> {
    let mut out = vec![bytes.len()];
    let mut pos = bytes.len();
    while pos > 0 {
        pos = prev_boundary(bytes, pos);
        out.push(pos);
    }
    out.reverse();
    out
}

#[derive(Debug, Clone)]
enum Edit {
    InsertRow(usize, Vec<u8>),
    DeleteRow(usize),
    InsertBytes(usize, usize, Vec<u8>),
    DeleteByte(usize, usize),
    Split(usize, usize),
    Join(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..8, text_strategy()).prop_map(|(at, t)| Edit::InsertRow(at, t)),
        (0usize..8).prop_map(Edit::DeleteRow),
        (0usize..8, 0usize..16, text_strategy()).prop_map(|(r, at, t)| Edit::InsertBytes(r, at, t)),
        (0usize..8, 0usize..16).prop_map(|(r, at)| Edit::DeleteByte(r, at)),
        (0usize..8, 0usize..16).prop_map(|(r, at)| Edit::Split(r, at)),
        (0usize..8).prop_map(Edit::Join),
    ]
}

fn apply(buffer: &mut Buffer, edit: &Edit) {
    match edit {
        Edit::InsertRow(at, text) => buffer.insert_row(*at, text.clone()),
        Edit::DeleteRow(at) => buffer.delete_row(*at),
        Edit::InsertBytes(row, at, text) => buffer.insert_bytes(*row, *at, text),
        Edit::DeleteByte(row, at) => buffer.delete_byte(*row, *at),
        Edit::Split(row, at) => buffer.split_row(*row, *at),
        Edit::Join(row) => {
            buffer.join_with_previous(*row);
        }
    }
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop::sample::select(vec![Key::Up, Key::Down, Key::Left, Key::Right])
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Boundary walks agree
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn boundary_walks_agree(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let forward = boundaries_forward(&bytes);
        prop_assert_eq!(&forward, &boundaries_backward(&bytes));
        for &b in &forward[1..forward.len() - 1] {
            prop_assert!(!is_continuation_byte(bytes[b]));
        }
    }

    #[test]
    fn boundary_walk_on_valid_utf8_matches_char_indices(s in "\\PC{0,24}") {
        let mut expected: Vec<usize> = s.char_indices().map(|(i, _)| i).collect();
        expected.push(s.len());
        prop_assert_eq!(boundaries_forward(s.as_bytes()), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Column round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn column_round_trip_lands_on_glyph_start(
        text in text_strategy(),
        offset in 0usize..48,
        tab_stop in 1usize..9,
    ) {
        let row = Row::new(text.clone(), tab_stop);
        let col = row.to_display_column(offset, tab_stop);
        let back = row.to_byte_offset(col, tab_stop);
        prop_assert!(back <= offset.min(row.len()));

        for b in boundaries_forward(&text) {
            let col = row.to_display_column(b, tab_stop);
            prop_assert_eq!(row.to_byte_offset(col, tab_stop), b);
        }
    }

    #[test]
    fn display_columns_increase_with_offset(text in text_strategy(), tab_stop in 1usize..9) {
        let row = Row::new(text.clone(), tab_stop);
        let cols: Vec<usize> = boundaries_forward(&text)
            .into_iter()
            .map(|b| row.to_display_column(b, tab_stop))
            .collect();
        prop_assert!(cols.windows(2).all(|w| w[0] < w[1]));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Render consistency
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rendered_has_no_tabs_and_full_highlight(
        lines in prop::collection::vec(text_strategy(), 0..6),
        tab_stop in 1usize..9,
    ) {
        let mut buffer = Buffer::from_lines(lines, tab_stop);
        buffer.set_syntax(syntax::select(BUILTIN, "t.c"));
        for row in buffer.rows() {
            prop_assert!(!row.rendered().contains(&b'\t'));
            prop_assert_eq!(row.highlight().len(), row.rendered().len());
            prop_assert_eq!(row.render_offset(row.len(), tab_stop), row.rendered().len());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Incremental highlighting equals a full pass
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cascade_matches_full_rehighlight(
        lines in prop::collection::vec(text_strategy(), 0..6),
        edits in prop::collection::vec(edit_strategy(), 0..12),
    ) {
        let c = syntax::select(BUILTIN, "t.c");
        let mut buffer = Buffer::from_lines(lines, 8);
        buffer.set_syntax(c);
        for edit in &edits {
            apply(&mut buffer, edit);
        }

        let mut fresh = Buffer::from_lines(buffer.rows().iter().map(|r| r.raw().to_vec()), 8);
        fresh.set_syntax(c);

        prop_assert_eq!(buffer.len(), fresh.len());
        for (i, (got, want)) in buffer.rows().iter().zip(fresh.rows()).enumerate() {
            prop_assert_eq!(got.highlight(), want.highlight(), "row {}", i);
            prop_assert_eq!(got.comment_carry(), want.comment_carry(), "row {}", i);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Cursor stays on a boundary
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cursor_stays_on_boundary(
        lines in prop::collection::vec(text_strategy(), 0..6),
        keys in prop::collection::vec(key_strategy(), 0..32),
    ) {
        let mut editor = Editor::new(Settings::default(), Size { cols: 40, rows: 8 });
        editor.set_buffer(Buffer::from_lines(lines, 8));
        for key in keys {
            editor.move_cursor(key);
            let (cx, cy) = editor.cursor();
            prop_assert!(cy <= editor.buffer().len());
            let raw = editor.buffer().row(cy).map_or(&[][..], Row::raw);
            prop_assert!(cx <= raw.len());
            prop_assert!(boundaries_forward(raw).contains(&cx));
        }
    }
}
