//! Rule-table syntax highlighting.
//!
//! [`highlight_line`] classifies every byte of one rendered row against a
//! [`Syntax`] table. Rows are scanned left to right by a small state machine
//! (code / block comment / string) with a single piece of cross-row state:
//! whether the row ends inside an unterminated block comment. The buffer
//! threads that carry from row to row and rehighlights downstream rows when
//! it changes.
//!
//! Classification order at each position, first hit wins:
//!
//! 1. line comment marker (code state only): rest of row is `Comment`
//! 2. block comment start/end markers (not inside a string)
//! 3. string literals, with `\` escaping the next byte
//! 4. numeric literals
//! 5. keywords, only at a token start and only when followed by a separator

use crate::syntax::{Keyword, KeywordClass, Syntax, SyntaxFlags};

// ---------------------------------------------------------------------------
// Highlight
// ---------------------------------------------------------------------------

/// Classification of one rendered byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Highlight {
    #[default]
    Normal,
    Comment,
    MlComment,
    Keyword1,
    Keyword2,
    String,
    Number,
    /// Search match overlay; never produced by [`highlight_line`].
    Match,
}

impl From<KeywordClass> for Highlight {
    fn from(class: KeywordClass) -> Self {
        match class {
            KeywordClass::Primary => Self::Keyword1,
            KeywordClass::Type => Self::Keyword2,
        }
    }
}

/// Whether `b` ends a token: whitespace, NUL, or one of `,.()+-/*=~%<>[];`.
#[must_use]
pub const fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'\t'
            | b'\n'
            | b'\r'
            | 0x0B
            | 0x0C
            | 0
            | b','
            | b'.'
            | b'('
            | b')'
            | b'+'
            | b'-'
            | b'/'
            | b'*'
            | b'='
            | b'~'
            | b'%'
            | b'<'
            | b'>'
            | b'['
            | b']'
            | b';'
    )
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    BlockComment,
    /// Inside a string opened by this quote byte.
    Str(u8),
}

/// Classify `rendered` into `out` (resized to `rendered.len()`).
///
/// `carry_in` is whether the previous row ended inside a block comment.
/// Returns the same for this row. With no syntax every byte is `Normal`
/// and the carry is `false`.
pub fn highlight_line(
    rendered: &[u8],
    syntax: Option<&Syntax>,
    carry_in: bool,
    out: &mut Vec<Highlight>,
) -> bool {
    out.clear();
    out.resize(rendered.len(), Highlight::Normal);

    let Some(syntax) = syntax else {
        return false;
    };

    // An empty marker counts as no marker.
    let line_comment = syntax
        .line_comment
        .map(str::as_bytes)
        .filter(|marker| !marker.is_empty());
    let block = syntax
        .block_comment
        .map(|(start, end)| (start.as_bytes(), end.as_bytes()))
        .filter(|(start, end)| !start.is_empty() && !end.is_empty());
    let numbers = syntax.flags.contains(SyntaxFlags::HIGHLIGHT_NUMBERS);
    let strings = syntax.flags.contains(SyntaxFlags::HIGHLIGHT_STRINGS);

    let mut scan = if carry_in && block.is_some() {
        Scan::BlockComment
    } else {
        Scan::Code
    };
    let mut prev_sep = true;
    let mut i = 0;

    while i < rendered.len() {
        let c = rendered[i];
        let prev_hl = if i > 0 { out[i - 1] } else { Highlight::Normal };
        let rest = &rendered[i..];

        if scan == Scan::Code && line_comment.is_some_and(|marker| rest.starts_with(marker)) {
            out[i..].fill(Highlight::Comment);
            break;
        }

        if let Some((start, end)) = block {
            match scan {
                Scan::BlockComment => {
                    if rest.starts_with(end) {
                        out[i..i + end.len()].fill(Highlight::MlComment);
                        i += end.len();
                        scan = Scan::Code;
                        prev_sep = true;
                    } else {
                        out[i] = Highlight::MlComment;
                        i += 1;
                    }
                    continue;
                }
                Scan::Code if rest.starts_with(start) => {
                    out[i..i + start.len()].fill(Highlight::MlComment);
                    i += start.len();
                    scan = Scan::BlockComment;
                    continue;
                }
                _ => {}
            }
        }

        if strings {
            if let Scan::Str(quote) = scan {
                out[i] = Highlight::String;
                if c == b'\\' && i + 1 < rendered.len() {
                    out[i + 1] = Highlight::String;
                    i += 2;
                    continue;
                }
                if c == quote {
                    scan = Scan::Code;
                }
                i += 1;
                prev_sep = true;
                continue;
            }
            if c == b'"' || c == b'\'' {
                scan = Scan::Str(c);
                out[i] = Highlight::String;
                i += 1;
                continue;
            }
        }

        if numbers
            && ((c.is_ascii_digit() && (prev_sep || prev_hl == Highlight::Number))
                || (c == b'.' && prev_hl == Highlight::Number))
        {
            out[i] = Highlight::Number;
            i += 1;
            prev_sep = false;
            continue;
        }

        if prev_sep {
            if let Some(kw) = keyword_at(rest, syntax) {
                let len = kw.text.len();
                out[i..i + len].fill(kw.class.into());
                i += len;
                prev_sep = false;
                continue;
            }
        }

        prev_sep = is_separator(c);
        i += 1;
    }

    scan == Scan::BlockComment
}

/// The first keyword that `rest` starts with, provided it is followed by a
/// separator or the end of the row.
fn keyword_at<'s>(rest: &[u8], syntax: &'s Syntax) -> Option<&'s Keyword> {
    syntax.keywords.iter().find(|kw| {
        let text = kw.text.as_bytes();
        !text.is_empty()
            && rest.starts_with(text)
            && is_separator(rest.get(text.len()).copied().unwrap_or(0))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
