//! Types for PTY session management.

use std::io::{self, Write};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use portable_pty::PtySize;

/// Fallback width when the invoking terminal size is unknown.
pub const DEFAULT_COLS: u16 = 80;

/// Fallback height when the invoking terminal size is unknown.
pub const DEFAULT_ROWS: u16 = 24;

/// Terminal dimensions for a PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtyDimensions {
    pub cols: u16,
    pub rows: u16,
}

impl PtyDimensions {
    /// Zero values fall back to the defaults.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: if cols == 0 { DEFAULT_COLS } else { cols },
            rows: if rows == 0 { DEFAULT_ROWS } else { rows },
        }
    }
}

impl Default for PtyDimensions {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl From<PtyDimensions> for PtySize {
    fn from(dims: PtyDimensions) -> Self {
        PtySize {
            rows: dims.rows,
            cols: dims.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

type WriterSlot = Arc<StdMutex<Option<Box<dyn Write + Send>>>>;

/// Handle to the PTY input side that stops accepting bytes once the
/// session is closed.
#[derive(Clone)]
pub struct PtyWriter {
    slot: WriterSlot,
}

impl PtyWriter {
    pub(crate) fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            slot: Arc::new(StdMutex::new(Some(writer))),
        }
    }

    /// Drop the underlying writer. Later writes fail with `BrokenPipe`.
    pub(crate) fn release(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }

    pub fn is_released(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl std::fmt::Debug for PtyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyWriter")
            .field("released", &self.is_released())
            .finish()
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "PTY closed")
}

impl Write for PtyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| io::Error::other("PTY writer poisoned"))?;
        match slot.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| io::Error::other("PTY writer poisoned"))?;
        match slot.as_mut() {
            Some(writer) => writer.flush(),
            None => Err(closed()),
        }
    }
}

/// Decides whether output read from the PTY may still be delivered.
///
/// Once sealed, no further chunk reaches the capture buffer or the display.
/// Sealing waits for a delivery already in progress, so nothing lands after
/// [`OutputGate::seal`] returns.
#[derive(Debug, Clone, Default)]
pub struct OutputGate {
    sealed: Arc<StdMutex<bool>>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seal(&self) {
        let mut sealed = self.sealed.lock().unwrap_or_else(PoisonError::into_inner);
        *sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.lock().map(|sealed| *sealed).unwrap_or(true)
    }

    /// Run `deliver` unless the gate is sealed. Returns whether it ran.
    pub fn deliver<F: FnOnce()>(&self, deliver: F) -> bool {
        let Ok(sealed) = self.sealed.lock() else {
            return false;
        };
        if *sealed {
            return false;
        }
        deliver();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_fall_back() {
        assert_eq!(PtyDimensions::new(0, 0), PtyDimensions::default());
        assert_eq!(PtyDimensions::new(120, 0).rows, DEFAULT_ROWS);
        assert_eq!(PtyDimensions::new(120, 40).cols, 120);
    }

    #[test]
    fn released_writer_rejects_bytes() {
        let mut writer = PtyWriter::new(Box::new(Vec::<u8>::new()));
        assert_eq!(writer.write(b"ls\n").ok(), Some(3));

        writer.release();
        writer.release();

        let err = writer.write(b"ls\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(writer.is_released());
    }

    #[test]
    fn sealed_gate_refuses_delivery() {
        let gate = OutputGate::new();
        let mut delivered = Vec::new();
        assert!(gate.deliver(|| delivered.push(1)));

        gate.clone().seal();

        assert!(gate.is_sealed());
        assert!(!gate.deliver(|| delivered.push(2)));
        assert_eq!(delivered, vec![1]);
    }
}
