//! PTY (Pseudo-Terminal) support.
//!
//! Running the child under a PTY keeps its output colorized and its
//! progress bars animating, because the child believes it is talking
//! to a real terminal. This module wraps the OS plumbing: spawning
//! under a PTY, probing the controlling terminal's geometry, and
//! putting local stdin into raw mode while the child runs.

mod native;

pub use native::PtySession;

use std::io::IsTerminal;

/// Size of a PTY in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    /// Number of rows (height).
    pub rows: u16,
    /// Number of columns (width).
    pub cols: u16,
}

impl PtySize {
    /// Create a new PtySize with the given dimensions.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for PtySize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Whether this process's stdout is an interactive terminal.
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Whether this process's stdin is an interactive terminal.
pub fn stdin_is_terminal() -> bool {
    std::io::stdin().is_terminal()
}

/// Probe the controlling terminal for its current size.
///
/// Checks stdin then stdout; returns `None` when neither is a
/// terminal (callers fall back to [`PtySize::default`]).
#[cfg(unix)]
pub fn current_window_size() -> Option<PtySize> {
    unsafe {
        let mut ws: libc::winsize = std::mem::zeroed();
        for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO] {
            if libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) == 0 && ws.ws_row > 0 && ws.ws_col > 0 {
                return Some(PtySize::new(ws.ws_row, ws.ws_col));
            }
        }
    }
    None
}

/// Probe the controlling terminal for its current size.
#[cfg(not(unix))]
pub fn current_window_size() -> Option<PtySize> {
    None
}

/// Puts stdin into raw mode on creation and restores the saved
/// settings on drop, so interactive keystrokes reach the child
/// unmangled while the PTY session runs.
#[cfg(unix)]
pub struct RawModeGuard {
    saved: libc::termios,
}

#[cfg(unix)]
impl RawModeGuard {
    /// Enable raw mode on stdin. Returns `None` when stdin is not a
    /// terminal or the mode switch fails; the session then simply runs
    /// without raw input.
    pub fn enable() -> Option<Self> {
        if !stdin_is_terminal() {
            return None;
        }
        unsafe {
            let mut term: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &mut term) != 0 {
                return None;
            }
            let saved = term;
            libc::cfmakeraw(&mut term);
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &term) != 0 {
                return None;
            }
            Some(Self { saved })
        }
    }
}

#[cfg(unix)]
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.saved);
        }
    }
}

/// No-op stand-in on platforms without termios.
#[cfg(not(unix))]
pub struct RawModeGuard;

#[cfg(not(unix))]
impl RawModeGuard {
    pub fn enable() -> Option<Self> {
        None
    }
}
