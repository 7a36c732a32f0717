// SPDX-License-Identifier: MIT
//
// kiloe — a small terminal text editor.
//
// This is the host binary that wires the two crates together:
//
//   k-term   → raw mode, key decoding, window size, escape sequences
//   k-editor → buffer, highlighting, search, frame composition
//
// Each iteration of the loop draws one frame and handles one key:
//
//   refresh_screen → stdout
//   stdin → Terminal::read_key → Editor::process_keypress → buffer mutation
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text area (+ gutter)         │  ← h - 2 rows
//   ├──────────────────────────────┤
//   │ status bar (reverse video)   │  ← 1 row
//   ├──────────────────────────────┤
//   │ message bar                  │  ← 1 row
//   └──────────────────────────────┘

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process;
use std::sync::Mutex;

use k_editor::{Editor, Outcome, Settings, HELP_MESSAGE};
use k_term::{ansi, Terminal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file. Unset means no logging.
const LOG_FILE_VAR: &str = "KILOE_LOG";

/// Environment variable holding `EnvFilter` directives.
const LOG_LEVEL_VAR: &str = "KILOE_LOG_LEVEL";

// ─── Logging ────────────────────────────────────────────────────────────────

/// Route `tracing` output to the file named by `KILOE_LOG`.
///
/// The terminal is in raw mode for the whole session, so logs never go to
/// stdout or stderr. A file that can't be created just disables logging.
fn init_logging() {
    let Some(path) = env::var_os(LOG_FILE_VAR) else {
        return;
    };
    let Ok(file) = File::create(&path) else {
        return;
    };

    let directives = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_owned());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    // Another subscriber already installed is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Run one editing session until the user quits.
///
/// The terminal guard lives inside this function, so raw mode is already
/// restored by the time `main` prints an error.
fn run(path: Option<String>) -> k_term::Result<()> {
    let settings = Settings::discover();

    let mut terminal = Terminal::new()?;
    let size = terminal.window_size()?;
    info!("session started");

    let mut editor = Editor::new(settings, size);
    if let Some(path) = path {
        editor.open(path)?;
    }
    editor.set_status(HELP_MESSAGE);

    let mut stdout = io::stdout();
    loop {
        editor.refresh_screen(&mut stdout)?;
        if editor.process_keypress(&mut terminal, &mut stdout)? == Outcome::Quit {
            break;
        }
    }

    ansi::clear_screen(&mut stdout)?;
    ansi::cursor_home(&mut stdout)?;
    stdout.flush()?;
    info!("session ended");
    Ok(())
}

fn main() {
    init_logging();

    let path = env::args().nth(1);
    if let Err(e) = run(path) {
        error!(error = %e, "fatal");
        eprintln!("kiloe: {e}");
        process::exit(1);
    }
}
