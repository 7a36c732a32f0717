//! Editor settings and the `kiloe.conf` file.
//!
//! # File format
//!
//! ```text
//! # comment
//! tab_stop = 4
//! show_line_numbers = true
//! color_comment = 90
//! ```
//!
//! One `key = value` per line. Blank lines and lines starting with `#` are
//! skipped; whitespace around keys and values is trimmed. Unknown keys and
//! unparsable values are logged and ignored, so a [`Settings`] is always
//! valid: the rest of the editor never re-checks it.
//!
//! | Key                 | Type    | Default                          |
//! |---------------------|---------|----------------------------------|
//! | `tab_stop`          | integer | 8                                |
//! | `quit_times`        | integer | 3                                |
//! | `show_line_numbers` | bool    | false                            |
//! | `welcome_message`   | text    | `Kiloe editor -- version 0.1.0`  |
//! | `status_timeout`    | seconds | 5                                |
//! | `color_comment`     | SGR     | 36                               |
//! | `color_keyword1`    | SGR     | 33                               |
//! | `color_keyword2`    | SGR     | 32                               |
//! | `color_string`      | SGR     | 35                               |
//! | `color_number`      | SGR     | 31                               |
//! | `color_match`       | SGR     | 34                               |
//!
//! Booleans are true for `true` or `1`, false for anything else.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::highlight::Highlight;

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "kiloe.conf";
/// Config file looked up in `$HOME`.
pub const HOME_CONFIG: &str = ".kiloe.conf";

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// SGR foreground codes per highlight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub comment: u8,
    pub keyword1: u8,
    pub keyword2: u8,
    pub string: u8,
    pub number: u8,
    pub matched: u8,
}

impl ColorScheme {
    /// The SGR code for `hl`, or `None` for the terminal's default
    /// foreground. Block comments share the comment color.
    #[must_use]
    pub const fn code_for(&self, hl: Highlight) -> Option<u8> {
        match hl {
            Highlight::Normal => None,
            Highlight::Comment | Highlight::MlComment => Some(self.comment),
            Highlight::Keyword1 => Some(self.keyword1),
            Highlight::Keyword2 => Some(self.keyword2),
            Highlight::String => Some(self.string),
            Highlight::Number => Some(self.number),
            Highlight::Match => Some(self.matched),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            comment: 36,
            keyword1: 33,
            keyword2: 32,
            string: 35,
            number: 31,
            matched: 34,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Validated editor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Columns per tab stop. Never 0.
    pub tab_stop: usize,
    /// Extra Ctrl-Q presses required to quit with unsaved changes.
    pub quit_times: usize,
    pub show_line_numbers: bool,
    pub welcome_message: String,
    /// How long a status message stays on the message bar.
    pub status_timeout: Duration,
    pub colors: ColorScheme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tab_stop: 8,
            quit_times: 3,
            show_line_numbers: false,
            welcome_message: format!("Kiloe editor -- version {}", env!("CARGO_PKG_VERSION")),
            status_timeout: Duration::from_secs(5),
            colors: ColorScheme::default(),
        }
    }
}

impl Settings {
    /// Defaults overridden by the directives in `text`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        settings.apply(text);
        settings
    }

    /// Apply every directive in `text` on top of the current values.
    pub fn apply(&mut self, text: &str) {
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line = lineno + 1, "config line without '=' ignored");
                continue;
            };
            self.set(key.trim(), value.trim());
        }
    }

    /// Apply a single `key = value` directive.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "tab_stop" => match parse_number::<usize>(key, value) {
                Some(0) => warn!(key, "tab_stop must be positive, keeping default"),
                Some(n) => self.tab_stop = n,
                None => {}
            },
            "quit_times" => {
                if let Some(n) = parse_number(key, value) {
                    self.quit_times = n;
                }
            }
            "show_line_numbers" => self.show_line_numbers = parse_bool(value),
            "welcome_message" => self.welcome_message = value.to_string(),
            "status_timeout" => {
                if let Some(secs) = parse_number(key, value) {
                    self.status_timeout = Duration::from_secs(secs);
                }
            }
            _ => {
                if let Some(slot) = self.color_slot(key) {
                    if let Some(code) = parse_number(key, value) {
                        *slot = code;
                    }
                } else {
                    warn!(key, "unknown config key ignored");
                }
            }
        }
    }

    fn color_slot(&mut self, key: &str) -> Option<&mut u8> {
        let colors = &mut self.colors;
        Some(match key.strip_prefix("color_")? {
            "comment" => &mut colors.comment,
            "keyword1" => &mut colors.keyword1,
            "keyword2" => &mut colors.keyword2,
            "string" => &mut colors.string,
            "number" => &mut colors.number,
            "match" => &mut colors.matched,
            _ => return None,
        })
    }

    /// Defaults overridden by the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "config loaded");
        Ok(Self::parse(&text))
    }

    /// Load the first readable file among `candidates`, or the defaults.
    #[must_use]
    pub fn load_first(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            match Self::from_file(path) {
                Ok(settings) => return settings,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path.display(), %err, "config unreadable"),
            }
        }
        Self::default()
    }

    /// `./kiloe.conf`, then `$HOME/.kiloe.conf`, then the defaults.
    #[must_use]
    pub fn discover() -> Self {
        Self::load_first(&candidate_paths())
    }
}

/// Where [`Settings::discover`] looks, in order.
#[must_use]
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(home) = env::var_os("HOME") {
        paths.push(Path::new(&home).join(HOME_CONFIG));
    }
    paths
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        warn!(key, value, "invalid number, keeping default");
    }
    parsed
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "1")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
