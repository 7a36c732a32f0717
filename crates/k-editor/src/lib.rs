//! # k-editor — Editor core for kiloe
//!
//! Everything between the terminal and the file lives here:
//!
//! - **[`utf8`]** — glyph boundaries and display width on raw bytes
//! - **[`row`]** — `Row`: raw bytes, tab-expanded render, per-byte highlight
//! - **[`syntax`]** — per-language rule tables and filename selection
//! - **[`highlight`]** — the rule-table highlighter and its comment carry
//! - **[`buffer`]** — `Buffer`: the row array, highlight cascade, file I/O
//! - **[`config`]** — `Settings` and the `kiloe.conf` format
//! - **[`editor`]** — `Editor`: cursor, editing operations, key dispatch
//! - **[`prompt`]** — message-bar input with a per-key observer
//! - **[`search`]** — incremental find and the match overlay
//! - **[`view`]** — frame composition: rows, status bar, message bar
//!
//! Terminal I/O itself is in `k-term`; this crate only needs a
//! [`KeySource`](k_term::KeySource) to read from and a writer to draw to.

pub mod buffer;
pub mod config;
pub mod editor;
pub mod highlight;
pub mod prompt;
pub mod row;
pub mod search;
pub mod syntax;
pub mod utf8;
pub mod view;

pub use buffer::Buffer;
pub use config::Settings;
pub use editor::{Editor, Outcome, HELP_MESSAGE};
pub use highlight::Highlight;
pub use prompt::PromptObserver;
pub use row::Row;
pub use search::FindSession;
pub use syntax::Syntax;
