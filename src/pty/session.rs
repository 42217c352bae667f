//! PTY session implementation using portable-pty.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, SlavePty};

use crate::error::ExecError;

use super::types::{OutputGate, PtyDimensions, PtyWriter};

/// Shell used to interpret the command line.
pub const SHELL: &str = "bash";

/// Child process handle returned by [`PtySession::start`].
pub type PtyChild = Box<dyn Child + Send + Sync>;

/// One pseudo-terminal pair running at most one child process.
///
/// The session is closed explicitly once the child has been waited on and
/// again on drop; closing twice is a no-op. Closing releases the device but
/// lets a reader cloned earlier drain what the child already wrote. Sealing
/// ends that: output read after [`PtySession::seal`] is never delivered.
pub struct PtySession {
    master: Option<Box<dyn MasterPty + Send>>,
    slave: Option<Box<dyn SlavePty + Send>>,
    writer: PtyWriter,
    gate: OutputGate,
    dimensions: PtyDimensions,
    started: bool,
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("dimensions", &self.dimensions)
            .field("started", &self.started)
            .field("closed", &self.is_closed())
            .field("sealed", &self.gate.is_sealed())
            .finish()
    }
}

impl PtySession {
    /// Allocate a PTY pair with the given size.
    pub fn open(dimensions: PtyDimensions) -> Result<Self, ExecError> {
        let pair = native_pty_system()
            .openpty(dimensions.into())
            .map_err(|e| ExecError::PtyAllocation(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ExecError::PtyAllocation(format!("failed to take writer: {e}")))?;

        log::debug!(
            "opened PTY {}x{}",
            dimensions.cols,
            dimensions.rows
        );

        Ok(Self {
            master: Some(pair.master),
            slave: Some(pair.slave),
            writer: PtyWriter::new(writer),
            gate: OutputGate::new(),
            dimensions,
            started: false,
        })
    }

    /// Spawn `bash -lc <command_line>` on the slave side with exactly the
    /// given environment.
    ///
    /// The child becomes a session leader with the PTY as its controlling
    /// terminal. The parent's slave handle is released afterwards so the
    /// master reports end-of-stream once the child side is gone.
    pub fn start(
        &mut self,
        command_line: &str,
        env: &[(OsString, OsString)],
    ) -> Result<PtyChild, ExecError> {
        if self.started {
            return Err(ExecError::ProcessStart(
                "session already has a child".to_string(),
            ));
        }
        let slave = self
            .slave
            .take()
            .ok_or_else(|| ExecError::ProcessStart("PTY is closed".to_string()))?;

        let cmd = shell_command(command_line, env, std::env::current_dir().ok());
        let child = slave
            .spawn_command(cmd)
            .map_err(|e| ExecError::ProcessStart(e.to_string()))?;
        drop(slave);
        self.started = true;

        log::debug!(
            "spawned {SHELL} -lc {command_line:?} (pid {:?})",
            child.process_id()
        );
        Ok(child)
    }

    /// Clone a reader over the terminal output.
    pub fn reader(&self) -> Result<Box<dyn Read + Send>, ExecError> {
        let master = self
            .master
            .as_ref()
            .ok_or_else(|| ExecError::PtyAllocation("PTY is closed".to_string()))?;
        master
            .try_clone_reader()
            .map_err(|e| ExecError::PtyAllocation(format!("failed to clone reader: {e}")))
    }

    /// Handle for writing terminal input. Writes fail once the session is
    /// closed.
    pub fn writer(&self) -> PtyWriter {
        self.writer.clone()
    }

    /// Gate the output pump delivers through.
    pub fn output_gate(&self) -> OutputGate {
        self.gate.clone()
    }

    pub const fn dimensions(&self) -> PtyDimensions {
        self.dimensions
    }

    pub fn is_closed(&self) -> bool {
        self.master.is_none()
    }

    /// Release the PTY device. Safe to call more than once.
    pub fn close(&mut self) {
        self.writer.release();
        self.slave.take();
        if self.master.take().is_some() {
            log::debug!("closed PTY");
        }
    }

    /// Stop delivering terminal output. Bytes the pump reads afterwards are
    /// discarded and the pump exits.
    pub fn seal(&self) {
        if !self.gate.is_sealed() {
            self.gate.seal();
            log::debug!("sealed PTY output");
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.close();
        self.seal();
    }
}

fn shell_command(
    command_line: &str,
    env: &[(OsString, OsString)],
    cwd: Option<PathBuf>,
) -> CommandBuilder {
    let mut cmd = CommandBuilder::new(SHELL);
    cmd.arg("-lc");
    cmd.arg(command_line);
    cmd.env_clear();
    for (key, value) in env {
        cmd.env(key, value);
    }
    if let Some(dir) = cwd {
        cmd.cwd(dir);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn shell_command_uses_login_bash() {
        let env = vec![(OsString::from("TERM"), OsString::from("xterm-256color"))];
        let cmd = shell_command("echo hi", &env, Some(PathBuf::from("/tmp")));

        let argv: Vec<&OsStr> = cmd.get_argv().iter().map(|a| a.as_os_str()).collect();
        assert_eq!(argv, vec![OsStr::new("bash"), OsStr::new("-lc"), OsStr::new("echo hi")]);
        assert_eq!(cmd.get_env("TERM"), Some(OsStr::new("xterm-256color")));
        assert_eq!(cmd.get_env("PATH"), None);
    }

    #[cfg(unix)]
    #[test]
    fn close_is_idempotent() {
        let mut session = PtySession::open(PtyDimensions::default()).expect("open pty");
        assert!(!session.is_closed());

        session.close();
        session.close();

        assert!(session.is_closed());
        assert!(session.writer().is_released());
        assert!(session.reader().is_err());
        assert!(!session.output_gate().is_sealed());
    }

    #[cfg(unix)]
    #[test]
    fn dropping_the_session_seals_output() {
        let session = PtySession::open(PtyDimensions::default()).expect("open pty");
        let gate = session.output_gate();

        session.seal();
        session.seal();
        assert!(gate.is_sealed());

        let fresh = PtySession::open(PtyDimensions::default()).expect("open pty");
        let fresh_gate = fresh.output_gate();
        drop(fresh);
        assert!(fresh_gate.is_sealed());
    }

    #[cfg(unix)]
    #[test]
    fn start_after_close_fails() {
        let mut session = PtySession::open(PtyDimensions::new(100, 30)).expect("open pty");
        assert_eq!(session.dimensions().cols, 100);
        session.close();

        let err = session.start("true", &[]).unwrap_err();
        assert!(matches!(err, ExecError::ProcessStart(_)));
    }
}
