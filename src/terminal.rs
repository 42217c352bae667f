//! Invoking-terminal helpers: size discovery and raw mode.

use std::io::IsTerminal;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};

use crate::pty::PtyDimensions;

/// Size of the invoking terminal, or 80x24 when it cannot be queried.
pub fn terminal_dimensions() -> PtyDimensions {
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => PtyDimensions::new(cols, rows),
        Ok(_) => PtyDimensions::default(),
        Err(err) => {
            log::debug!("terminal size unavailable, using default: {err}");
            PtyDimensions::default()
        }
    }
}

/// Raw mode held on the invoking terminal. Dropping the guard restores
/// the previous mode.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    /// Switch stdin's terminal to raw mode.
    ///
    /// Returns `None` when stdin is not a terminal, when it is already raw
    /// (someone else owns the restore), or when switching fails. None of
    /// these stop the command from running.
    pub fn acquire() -> Option<Self> {
        if !std::io::stdin().is_terminal() {
            return None;
        }
        if is_raw_mode_enabled().unwrap_or(false) {
            return None;
        }
        match enable_raw_mode() {
            Ok(()) => Some(Self { _private: () }),
            Err(err) => {
                log::debug!("raw mode unavailable: {err}");
                None
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            log::warn!("failed to restore terminal mode: {err}");
        }
    }
}
