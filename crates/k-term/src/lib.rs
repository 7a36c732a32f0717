// SPDX-License-Identifier: MIT
//
// k-term — Terminal protocol for kiloe.
//
// Everything the editor says to, or hears from, the terminal goes through
// this crate: raw-mode entry and unconditional restore, decoding stdin bytes
// into keys, measuring the screen, and encoding the handful of control
// sequences a frame is built from. No TUI framework sits in between; the
// bytes on the wire are the bytes written here.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod terminal;

pub use error::{Result, TermError};
pub use input::Key;
pub use output::OutputBuffer;
pub use terminal::{KeySource, Size, Terminal};
