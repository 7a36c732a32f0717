// SPDX-License-Identifier: MIT
//
// Terminal errors.
//
// Everything that can go wrong while talking to the terminal is a startup
// problem: the attributes can't be read or written, or the screen size
// can't be measured. The host treats all of these as fatal.

use std::io;

use thiserror::Error;

/// Failure while configuring or querying the terminal.
#[derive(Debug, Error)]
pub enum TermError {
    /// A POSIX terminal call (`tcgetattr`, `tcsetattr`, `read`) failed.
    #[error("{op} failed: {source}")]
    Os {
        /// Name of the failing call, for the error message.
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Neither `ioctl(TIOCGWINSZ)` nor the cursor-position fallback
    /// produced a usable screen size.
    #[error("could not determine the terminal size")]
    Geometry,

    /// Writing a control sequence to the terminal failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

impl TermError {
    /// Wrap the current `errno` for a failed POSIX call.
    #[must_use]
    pub fn last_os_error(op: &'static str) -> Self {
        Self::Os {
            op,
            source: io::Error::last_os_error(),
        }
    }
}

/// Result alias used throughout the terminal crate.
pub type Result<T> = std::result::Result<T, TermError>;
