// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, key reads, geometry, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd reads/writes. These
// are the standard POSIX interfaces for terminal control; there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's session state: the attributes captured at
// startup and the raw attributes installed over them. Raw mode here is the
// classic editor flavor (no echo, no line buffering, no signal keys, no
// output post-processing) with a short read timeout (VMIN = 0, VTIME > 0) so a read returns empty-handed every
// tenth of a second and the host loop can redraw even without input.
//
// Restoration is unconditional. `Drop` restores the original attributes on
// every normal exit path, and a once-installed panic hook restores them from
// a global backup when the editor panics mid-frame.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use tracing::{debug, info, warn};

use crate::ansi;
use crate::error::{Result, TermError};
use crate::input::{self, Key};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// terminal reports a zero width.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Parse a cursor position report: `ESC [ rows ; cols` (the trailing `R`
/// already stripped).
///
/// Returns `None` for anything malformed, including zero dimensions.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let body = reply.strip_prefix(b"\x1b[")?;
    let body = body.strip_suffix(b"R").unwrap_or(body);
    let sep = body.iter().position(|&b| b == b';')?;
    let rows = parse_decimal(&body[..sep])?;
    let cols = parse_decimal(&body[sep + 1..])?;
    (rows > 0 && cols > 0).then_some(Size { cols, rows })
}

/// Parse an unsigned decimal directly from bytes. No sign, no whitespace.
fn parse_decimal(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u16, |acc, &b| {
        if b.is_ascii_digit() {
            acc.checked_mul(10)?.checked_add(u16::from(b - b'0'))
        } else {
            None
        }
    })
}

/// Longest cursor report we are willing to read (`ESC[65535;65535R` fits).
const CURSOR_REPORT_MAX: usize = 31;

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup, behind a [`Mutex`] rather than a
/// `static mut`, lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Terminal cleanup sequence for emergency use: reset attributes, clear the
/// screen, home the cursor, show the cursor.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[m\
    \x1b[2J\
    \x1b[H\
    \x1b[?25h";

/// Ensures the panic hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor,
/// bypassing the stdout lock in case the panic happened while it was held.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Key Source ─────────────────────────────────────────────────────────────

/// Anything that can hand the editor one decoded key at a time.
///
/// [`Terminal`] reads from stdin; tests substitute a scripted source.
pub trait KeySource {
    /// Block until a key is available and return it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the underlying read fails for a reason
    /// other than the read timeout.
    fn read_key(&mut self) -> Result<Key>;
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Default read timeout in tenths of a second (VTIME).
pub const DEFAULT_READ_TIMEOUT: u8 = 1;

/// Raw-mode terminal session with RAII cleanup.
///
/// Construction captures the original attributes and installs raw ones;
/// dropping the handle puts the originals back.
///
/// # Example
///
/// ```no_run
/// use k_term::terminal::{KeySource, Terminal};
///
/// let mut term = Terminal::new()?;
/// let size = term.window_size()?;
/// let key = term.read_key()?;
/// // Original attributes are restored when `term` is dropped.
/// # Ok::<(), k_term::TermError>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
}

impl Terminal {
    /// Enter raw mode with the default read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Os`] if the terminal attributes cannot be read
    /// or written (stdin is not a terminal, for instance).
    pub fn new() -> Result<Self> {
        Self::with_read_timeout(DEFAULT_READ_TIMEOUT)
    }

    /// Enter raw mode; reads give up after `deciseconds` tenths of a second.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Os`] if the terminal attributes cannot be read
    /// or written.
    pub fn with_read_timeout(deciseconds: u8) -> Result<Self> {
        install_panic_hook();

        let mut term = Self {
            #[cfg(unix)]
            original_termios: None,
        };
        term.enable_raw_mode(deciseconds)?;
        Ok(term)
    }

    /// Measure the screen.
    ///
    /// Asks the OS first. If that fails or reports zero columns, parks the
    /// cursor in the bottom-right corner and asks the terminal where it
    /// ended up. There is no third option.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Geometry`] if both methods fail, or
    /// [`TermError::Io`] if the fallback query cannot be written.
    pub fn window_size(&mut self) -> Result<Size> {
        let size = match get_size() {
            Some(size) => size,
            None => {
                debug!("TIOCGWINSZ unavailable, falling back to cursor position report");
                let mut stdout = io::stdout().lock();
                ansi::cursor_to_extreme(&mut stdout)?;
                drop(stdout);
                self.cursor_position()?
            }
        };
        info!(cols = size.cols, rows = size.rows, "window size");
        Ok(size)
    }

    /// Query the cursor position with a device status report round trip.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Geometry`] if the reply is missing or malformed.
    pub fn cursor_position(&mut self) -> Result<Size> {
        let mut stdout = io::stdout().lock();
        ansi::request_cursor_position(&mut stdout)?;
        stdout.flush()?;
        drop(stdout);

        let mut reply = Vec::with_capacity(CURSOR_REPORT_MAX);
        while reply.len() < CURSOR_REPORT_MAX {
            match self.read_byte()? {
                Some(b'R') | None => break,
                Some(b) => reply.push(b),
            }
        }

        parse_cursor_report(&reply).ok_or_else(|| {
            warn!(reply = ?String::from_utf8_lossy(&reply), "malformed cursor position report");
            TermError::Geometry
        })
    }

    /// Read one byte from stdin, or `None` if the read timed out.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Os`] if `read` fails with anything other than
    /// `EAGAIN`/`EINTR`.
    #[cfg(unix)]
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(TermError::Os {
                        op: "read",
                        source: err,
                    }),
                }
            }
        }
    }

    #[cfg(not(unix))]
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        use std::io::Read;
        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self, deciseconds: u8) -> Result<()> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(TermError::last_os_error("tcgetattr"));
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);

            // VMIN=0, VTIME=n: read() returns after n/10 s even with no input.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = deciseconds;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TermError::last_os_error("tcsetattr"));
            }
        }

        info!(read_timeout_ds = deciseconds, "raw mode enabled");
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self, _deciseconds: u8) -> Result<()> {
        Err(TermError::Os {
            op: "tcgetattr",
            source: io::Error::from(io::ErrorKind::Unsupported),
        })
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<()> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(TermError::last_os_error("tcsetattr"));
                }
            }

            // Restored; the panic hook has nothing left to do.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
            info!("raw mode disabled");
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }
}

impl KeySource for Terminal {
    fn read_key(&mut self) -> Result<Key> {
        let first = loop {
            if let Some(byte) = self.read_byte()? {
                break byte;
            }
        };
        Ok(input::decode_key(first, || self.read_byte().ok().flatten()))
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.disable_raw_mode() {
            warn!(error = %e, "failed to restore terminal attributes");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
