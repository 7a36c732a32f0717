//! Single-line input on the message bar.
//!
//! [`Editor::prompt`] reads keys until the user confirms with Enter or
//! cancels with Escape, redrawing the screen after every key so the input
//! is visible. An optional [`PromptObserver`] sees every key together with
//! the input so far; incremental search is built on that hook.

use std::io::Write;

use k_term::{Key, KeySource};

use crate::editor::Editor;
use crate::utf8::prev_boundary;

/// Called after every key the prompt reads, including the final Enter or
/// Escape.
pub trait PromptObserver {
    fn on_key(&mut self, editor: &mut Editor, input: &[u8], key: Key);
}

impl<F> PromptObserver for F
where
    F: FnMut(&mut Editor, &[u8], Key),
{
    fn on_key(&mut self, editor: &mut Editor, input: &[u8], key: Key) {
        self(editor, input, key);
    }
}

impl Editor {
    /// Ask for a line of input. `message` renders the message bar from the
    /// input so far.
    ///
    /// Returns `None` when cancelled. Enter on empty input is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if reading a key or drawing a frame fails.
    pub fn prompt(
        &mut self,
        keys: &mut impl KeySource,
        screen: &mut impl Write,
        message: impl Fn(&str) -> String,
        mut observer: Option<&mut dyn PromptObserver>,
    ) -> k_term::Result<Option<Vec<u8>>> {
        let mut input: Vec<u8> = Vec::new();

        loop {
            self.set_status(message(&String::from_utf8_lossy(&input)));
            self.refresh_screen(screen)?;

            let key = keys.read_key()?;
            let mut done = None;
            match key {
                k if k == Key::BACKSPACE || k == Key::ctrl(b'h') || k == Key::Delete => {
                    let cut = prev_boundary(&input, input.len());
                    input.truncate(cut);
                }
                Key::Escape => {
                    self.set_status("");
                    done = Some(None);
                }
                Key::ENTER if !input.is_empty() => {
                    self.set_status("");
                    done = Some(Some(input.clone()));
                }
                Key::Char(b) if !Key::Char(b).is_control() => input.push(b),
                _ => {}
            }

            if let Some(observer) = observer.as_deref_mut() {
                observer.on_key(self, &input, key);
            }
            if let Some(result) = done {
                return Ok(result);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
