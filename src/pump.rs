//! Copy tasks between the invoking terminal and the PTY.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::pty::{OutputGate, PtyWriter};

const READ_BUFFER_SIZE: usize = 8192;

/// Append-only accumulator for terminal output. The output pump is the only
/// writer.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<StdMutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, chunk: &[u8]) {
        if let Ok(mut bytes) = self.bytes.lock() {
            bytes.extend_from_slice(chunk);
        }
    }

    /// Copy of everything captured so far.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Start forwarding `input` into the PTY on a detached thread.
///
/// The thread is never joined. It usually sits in a blocking read on stdin
/// when the command finishes and is left there; it exits on its own after
/// its next read once the PTY writer has been released, or when the
/// process exits.
pub fn spawn_input_forwarder<R>(mut input: R, mut pty: PtyWriter)
where
    R: Read + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("ptyexec-input".to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if pty.write_all(&buf[..n]).and_then(|()| pty.flush()).is_err() {
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            log::trace!("input forwarder finished");
        });
    if let Err(err) = spawned {
        log::warn!("failed to start input forwarder: {err}");
    }
}

/// Receiver side of the output pump's completion signal.
pub type OutputDone = oneshot::Receiver<()>;

/// Start copying PTY output to `display` and `capture` on its own thread.
///
/// Every chunk is delivered through `gate`. The copy ends on end-of-stream,
/// a read error (`EIO` once no process holds the slave side any more) or
/// the first read that completes after the gate is sealed, and then fires
/// the returned signal. The reader and display are dropped on exit.
pub fn spawn_output_pump<R, W>(
    mut reader: R,
    mut display: W,
    capture: CaptureBuffer,
    gate: OutputGate,
) -> std::io::Result<OutputDone>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("ptyexec-output".to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            let mut display_ok = true;
            while !gate.is_sealed() {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let chunk = &buf[..n];
                        let delivered = gate.deliver(|| {
                            capture.append(chunk);
                            if display_ok {
                                display_ok = display
                                    .write_all(chunk)
                                    .and_then(|()| display.flush())
                                    .is_ok();
                                if !display_ok {
                                    log::debug!("display sink failed; capturing only");
                                }
                            }
                        });
                        if !delivered {
                            log::trace!("output sealed, dropped {n} bytes");
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                        continue;
                    }
                    Err(e) => {
                        log::trace!("PTY read ended: {e}");
                        break;
                    }
                }
            }
            let _ = done_tx.send(());
        })?;
    Ok(done_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn output_is_mirrored_and_captured() {
        let sink = SharedSink::default();
        let capture = CaptureBuffer::new();
        let done = spawn_output_pump(
            Cursor::new(b"hello\r\nworld\r\n".to_vec()),
            sink.clone(),
            capture.clone(),
            OutputGate::new(),
        )
        .unwrap();

        done.await.unwrap();
        assert_eq!(capture.snapshot(), b"hello\r\nworld\r\n");
        assert_eq!(*sink.0.lock().unwrap(), b"hello\r\nworld\r\n");
    }

    #[tokio::test]
    async fn capture_survives_broken_display() {
        let capture = CaptureBuffer::new();
        let payload = vec![b'x'; READ_BUFFER_SIZE * 3];
        let done = spawn_output_pump(
            Cursor::new(payload.clone()),
            BrokenSink,
            capture.clone(),
            OutputGate::new(),
        )
        .unwrap();

        done.await.unwrap();
        assert_eq!(capture.len(), payload.len());
    }

    /// Yields one chunk per read and seals the gate before yielding the
    /// chunk at `seal_at`, the way a late write races the end of a run.
    struct SealingReader {
        chunks: Vec<&'static [u8]>,
        reads: usize,
        seal_at: usize,
        gate: OutputGate,
    }

    impl Read for SealingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.reads == self.seal_at {
                self.gate.seal();
            }
            let Some(chunk) = self.chunks.get(self.reads) else {
                return Ok(0);
            };
            self.reads += 1;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[tokio::test]
    async fn output_read_after_sealing_is_dropped() {
        let sink = SharedSink::default();
        let capture = CaptureBuffer::new();
        let gate = OutputGate::new();
        let reader = SealingReader {
            chunks: vec![&b"early\r\n"[..], &b"late\r\n"[..], &b"later\r\n"[..]],
            reads: 0,
            seal_at: 1,
            gate: gate.clone(),
        };

        let done = spawn_output_pump(reader, sink.clone(), capture.clone(), gate).unwrap();

        done.await.unwrap();
        assert_eq!(capture.snapshot(), b"early\r\n");
        assert_eq!(*sink.0.lock().unwrap(), b"early\r\n");
    }

    #[tokio::test]
    async fn sealed_gate_stops_pump_before_reading() {
        let sink = SharedSink::default();
        let capture = CaptureBuffer::new();
        let gate = OutputGate::new();
        gate.seal();

        let done = spawn_output_pump(
            Cursor::new(b"never shown".to_vec()),
            sink.clone(),
            capture.clone(),
            gate,
        )
        .unwrap();

        done.await.unwrap();
        assert!(capture.is_empty());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn input_forwarder_writes_into_pty() {
        let sink = SharedSink::default();
        let writer = PtyWriter::new(Box::new(sink.clone()));
        spawn_input_forwarder(Cursor::new(b"y\n".to_vec()), writer);

        for _ in 0..100 {
            if !sink.0.lock().unwrap().is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(*sink.0.lock().unwrap(), b"y\n");
    }
}
