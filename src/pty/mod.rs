//! PTY (Pseudo-Terminal) session for running one shell command.

mod session;
pub mod types;

pub use session::{PtyChild, PtySession, SHELL};
pub use types::{OutputGate, PtyDimensions, PtyWriter, DEFAULT_COLS, DEFAULT_ROWS};
