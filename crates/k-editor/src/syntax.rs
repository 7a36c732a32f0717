//! Syntax rule tables — per-language keywords, comment markers and flags.
//!
//! A [`Syntax`] is plain data: the highlighter in [`highlight`](crate::highlight)
//! interprets it. Tables are `'static` so a buffer can hold a cheap
//! `&'static Syntax` and every row can be rehighlighted without cloning.
//!
//! # Selection
//!
//! [`select`] scans a table list in order and returns the first table with a
//! pattern matching the filename:
//!
//! - a pattern starting with `.` is an extension and must equal the text
//!   from the filename's **last** `.` to its end (`main.c` matches `.c`,
//!   `main.cc` does not);
//! - any other pattern matches if it appears anywhere in the filename
//!   (`Makefile` matches `akefile`).

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

bitflags! {
    /// Optional highlighting features a language opts into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SyntaxFlags: u8 {
        /// Color numeric literals.
        const HIGHLIGHT_NUMBERS = 1 << 0;
        /// Color `"…"` and `'…'` literals.
        const HIGHLIGHT_STRINGS = 1 << 1;
    }
}

/// Which of the two keyword colors a keyword gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordClass {
    /// Control flow and declarations (`if`, `return`, `struct`).
    Primary,
    /// Type names (`int`, `str`, `Array`).
    Type,
}

/// A keyword and its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keyword {
    pub text: &'static str,
    pub class: KeywordClass,
}

impl Keyword {
    /// A [`KeywordClass::Primary`] keyword.
    #[must_use]
    pub const fn primary(text: &'static str) -> Self {
        Self { text, class: KeywordClass::Primary }
    }

    /// A [`KeywordClass::Type`] keyword.
    #[must_use]
    pub const fn type_name(text: &'static str) -> Self {
        Self { text, class: KeywordClass::Type }
    }
}

/// Highlighting rules for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syntax {
    /// Shown in the status bar (`c`, `python`).
    pub filetype: &'static str,
    /// Filename patterns, see the module docs.
    pub filematch: &'static [&'static str],
    /// Checked in order; the first match at a position wins.
    pub keywords: &'static [Keyword],
    pub line_comment: Option<&'static str>,
    /// `(start, end)` markers.
    pub block_comment: Option<(&'static str, &'static str)>,
    pub flags: SyntaxFlags,
}

impl Syntax {
    /// Whether any of this table's patterns matches `filename`.
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        let extension = filename.rfind('.').map(|dot| &filename[dot..]);
        self.filematch.iter().any(|pattern| {
            if pattern.starts_with('.') {
                extension == Some(*pattern)
            } else {
                filename.contains(pattern)
            }
        })
    }
}

/// First table in `tables` matching `filename`.
#[must_use]
pub fn select<'a>(tables: &'a [Syntax], filename: &str) -> Option<&'a Syntax> {
    tables.iter().find(|syntax| syntax.matches(filename))
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

const NUMBERS_AND_STRINGS: SyntaxFlags =
    SyntaxFlags::HIGHLIGHT_NUMBERS.union(SyntaxFlags::HIGHLIGHT_STRINGS);

const C_KEYWORDS: &[Keyword] = &[
    Keyword::primary("switch"),
    Keyword::primary("if"),
    Keyword::primary("while"),
    Keyword::primary("for"),
    Keyword::primary("break"),
    Keyword::primary("continue"),
    Keyword::primary("return"),
    Keyword::primary("else"),
    Keyword::primary("struct"),
    Keyword::primary("union"),
    Keyword::primary("typedef"),
    Keyword::primary("static"),
    Keyword::primary("enum"),
    Keyword::primary("class"),
    Keyword::primary("case"),
    Keyword::type_name("int"),
    Keyword::type_name("long"),
    Keyword::type_name("double"),
    Keyword::type_name("float"),
    Keyword::type_name("char"),
    Keyword::type_name("unsigned"),
    Keyword::type_name("signed"),
    Keyword::type_name("void"),
];

const PYTHON_KEYWORDS: &[Keyword] = &[
    Keyword::primary("and"),
    Keyword::primary("as"),
    Keyword::primary("assert"),
    Keyword::primary("break"),
    Keyword::primary("class"),
    Keyword::primary("continue"),
    Keyword::primary("def"),
    Keyword::primary("del"),
    Keyword::primary("elif"),
    Keyword::primary("else"),
    Keyword::primary("except"),
    Keyword::primary("finally"),
    Keyword::primary("for"),
    Keyword::primary("from"),
    Keyword::primary("global"),
    Keyword::primary("if"),
    Keyword::primary("import"),
    Keyword::primary("in"),
    Keyword::primary("is"),
    Keyword::primary("lambda"),
    Keyword::primary("nonlocal"),
    Keyword::primary("not"),
    Keyword::primary("or"),
    Keyword::primary("pass"),
    Keyword::primary("raise"),
    Keyword::primary("return"),
    Keyword::primary("try"),
    Keyword::primary("while"),
    Keyword::primary("with"),
    Keyword::primary("yield"),
    Keyword::primary("False"),
    Keyword::primary("None"),
    Keyword::primary("True"),
    Keyword::type_name("int"),
    Keyword::type_name("float"),
    Keyword::type_name("str"),
    Keyword::type_name("list"),
    Keyword::type_name("dict"),
    Keyword::type_name("tuple"),
    Keyword::type_name("set"),
    Keyword::type_name("bool"),
];

const JAVASCRIPT_KEYWORDS: &[Keyword] = &[
    Keyword::primary("break"),
    Keyword::primary("case"),
    Keyword::primary("catch"),
    Keyword::primary("class"),
    Keyword::primary("const"),
    Keyword::primary("continue"),
    Keyword::primary("debugger"),
    Keyword::primary("default"),
    Keyword::primary("delete"),
    Keyword::primary("do"),
    Keyword::primary("else"),
    Keyword::primary("export"),
    Keyword::primary("extends"),
    Keyword::primary("finally"),
    Keyword::primary("for"),
    Keyword::primary("function"),
    Keyword::primary("if"),
    Keyword::primary("import"),
    Keyword::primary("in"),
    Keyword::primary("instanceof"),
    Keyword::primary("let"),
    Keyword::primary("new"),
    Keyword::primary("return"),
    Keyword::primary("super"),
    Keyword::primary("switch"),
    Keyword::primary("this"),
    Keyword::primary("throw"),
    Keyword::primary("try"),
    Keyword::primary("typeof"),
    Keyword::primary("var"),
    Keyword::primary("void"),
    Keyword::primary("while"),
    Keyword::primary("with"),
    Keyword::primary("yield"),
    Keyword::primary("async"),
    Keyword::primary("await"),
    Keyword::primary("true"),
    Keyword::primary("false"),
    Keyword::primary("null"),
    Keyword::type_name("boolean"),
    Keyword::type_name("number"),
    Keyword::type_name("string"),
    Keyword::type_name("object"),
    Keyword::type_name("undefined"),
];

const RUBY_KEYWORDS: &[Keyword] = &[
    Keyword::primary("alias"),
    Keyword::primary("and"),
    Keyword::primary("begin"),
    Keyword::primary("break"),
    Keyword::primary("case"),
    Keyword::primary("class"),
    Keyword::primary("def"),
    Keyword::primary("defined?"),
    Keyword::primary("do"),
    Keyword::primary("else"),
    Keyword::primary("elsif"),
    Keyword::primary("end"),
    Keyword::primary("ensure"),
    Keyword::primary("false"),
    Keyword::primary("for"),
    Keyword::primary("if"),
    Keyword::primary("in"),
    Keyword::primary("module"),
    Keyword::primary("next"),
    Keyword::primary("nil"),
    Keyword::primary("not"),
    Keyword::primary("or"),
    Keyword::primary("redo"),
    Keyword::primary("rescue"),
    Keyword::primary("retry"),
    Keyword::primary("return"),
    Keyword::primary("self"),
    Keyword::primary("super"),
    Keyword::primary("then"),
    Keyword::primary("true"),
    Keyword::primary("undef"),
    Keyword::primary("unless"),
    Keyword::primary("until"),
    Keyword::primary("when"),
    Keyword::primary("while"),
    Keyword::primary("yield"),
    Keyword::type_name("Array"),
    Keyword::type_name("Hash"),
    Keyword::type_name("String"),
    Keyword::type_name("Integer"),
    Keyword::type_name("Float"),
    Keyword::type_name("Symbol"),
    Keyword::type_name("Object"),
];

const HTML_KEYWORDS: &[Keyword] = &[
    Keyword::primary("html"),
    Keyword::primary("head"),
    Keyword::primary("title"),
    Keyword::primary("body"),
    Keyword::primary("div"),
    Keyword::primary("span"),
    Keyword::primary("p"),
    Keyword::primary("a"),
    Keyword::primary("img"),
    Keyword::primary("br"),
    Keyword::primary("hr"),
    Keyword::primary("h1"),
    Keyword::primary("h2"),
    Keyword::primary("h3"),
    Keyword::primary("h4"),
    Keyword::primary("h5"),
    Keyword::primary("h6"),
    Keyword::primary("ul"),
    Keyword::primary("ol"),
    Keyword::primary("li"),
    Keyword::primary("table"),
    Keyword::primary("tr"),
    Keyword::primary("td"),
    Keyword::primary("th"),
    Keyword::primary("form"),
    Keyword::primary("input"),
    Keyword::primary("button"),
    Keyword::primary("script"),
    Keyword::primary("style"),
    Keyword::primary("link"),
    Keyword::primary("meta"),
];

/// Languages recognized out of the box, in selection order.
pub static BUILTIN: &[Syntax] = &[
    Syntax {
        filetype: "c",
        filematch: &[".c", ".h", ".cpp", ".cc", ".cxx"],
        keywords: C_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        flags: NUMBERS_AND_STRINGS,
    },
    Syntax {
        filetype: "python",
        filematch: &[".py", ".pyw"],
        keywords: PYTHON_KEYWORDS,
        line_comment: Some("#"),
        block_comment: None,
        flags: NUMBERS_AND_STRINGS,
    },
    Syntax {
        filetype: "javascript",
        filematch: &[".js", ".jsx", ".ts", ".tsx"],
        keywords: JAVASCRIPT_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        flags: NUMBERS_AND_STRINGS,
    },
    Syntax {
        filetype: "ruby",
        filematch: &[".rb", ".rbw", ".rake"],
        keywords: RUBY_KEYWORDS,
        line_comment: Some("#"),
        block_comment: None,
        flags: NUMBERS_AND_STRINGS,
    },
    Syntax {
        filetype: "html",
        filematch: &[".html", ".htm", ".xml", ".xhtml"],
        keywords: HTML_KEYWORDS,
        line_comment: None,
        block_comment: Some(("<!--", "-->")),
        flags: SyntaxFlags::HIGHLIGHT_STRINGS,
    },
    Syntax {
        filetype: "markdown",
        filematch: &[".md", ".markdown", ".mkd"],
        keywords: &[],
        line_comment: None,
        block_comment: None,
        flags: SyntaxFlags::empty(),
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
