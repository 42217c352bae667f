use std::time::Duration;

use thiserror::Error;

/// Error types that can occur while running a command inside a PTY.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The pseudo-terminal pair could not be allocated
    #[error("failed to open PTY: {0}")]
    PtyAllocation(String),
    /// The shell could not be spawned on the PTY slave
    #[error("failed to start process: {0}")]
    ProcessStart(String),
    /// The process exited unsuccessfully or could not be waited on
    #[error("process failed: {0}")]
    ProcessExecution(String),
    /// The command outlived its timeout
    #[error("process timed out after {}ms", .0.as_millis())]
    TimeoutExceeded(Duration),
}

impl ExecError {
    /// Whether the error was caused by the command timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded(_))
    }
}

/// A failed execution together with whatever output was captured before
/// the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not execute: {error}")]
pub struct ExecFailure {
    /// Raw captured output, without prompt line or cleaning.
    pub output: String,
    #[source]
    pub error: ExecError,
}

impl ExecFailure {
    pub fn new(output: impl Into<String>, error: ExecError) -> Self {
        Self {
            output: output.into(),
            error,
        }
    }

    /// Failure raised before any output could have been produced.
    pub fn without_output(error: ExecError) -> Self {
        Self::new(String::new(), error)
    }
}
