//! Runs one command in a PTY, mirroring and capturing its output.

use std::io::{Read, Write};

use crate::drain::{wait_for_drain, DRAIN_GRACE_PERIOD};
use crate::env::child_env_from_process;
use crate::error::{ExecError, ExecFailure};
use crate::output::{clean_output, decode_capture};
use crate::prompt::PromptContext;
use crate::pty::{PtyDimensions, PtySession};
use crate::pump::{spawn_input_forwarder, spawn_output_pump, CaptureBuffer};
use crate::request::ExecRequest;
use crate::supervisor::{kill_and_reap, supervise, WaitOutcome};
use crate::terminal::{terminal_dimensions, RawModeGuard};

/// Where terminal input comes from and where live output goes.
pub struct ExecStreams {
    input: Box<dyn Read + Send>,
    display: Box<dyn Write + Send>,
    dimensions: Option<PtyDimensions>,
    raw_mode: bool,
}

impl std::fmt::Debug for ExecStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecStreams")
            .field("dimensions", &self.dimensions)
            .field("raw_mode", &self.raw_mode)
            .finish()
    }
}

impl ExecStreams {
    /// The process's own stdin/stdout. Raw mode is requested on the
    /// terminal and the PTY takes the terminal's size.
    pub fn stdio() -> Self {
        Self {
            input: Box::new(std::io::stdin()),
            display: Box::new(std::io::stdout()),
            dimensions: None,
            raw_mode: true,
        }
    }

    /// Custom streams. The invoking terminal is left untouched and the PTY
    /// is 80x24 unless [`ExecStreams::dimensions`] says otherwise.
    pub fn new<R, W>(input: R, display: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            input: Box::new(input),
            display: Box::new(display),
            dimensions: Some(PtyDimensions::default()),
            raw_mode: false,
        }
    }

    #[must_use]
    pub fn dimensions(mut self, dimensions: PtyDimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Run `request` against the process's stdin/stdout.
pub async fn execute_command(request: &ExecRequest) -> Result<String, ExecFailure> {
    execute_with(request, ExecStreams::stdio()).await
}

/// Run `request` with the given streams.
///
/// On success the cleaned output is returned, prefixed with the prompt
/// line when requested. On failure the raw capture is returned alongside
/// the error. Output is sealed before this returns, so nothing reaches
/// `display` afterwards. The input forwarder may still be blocked reading
/// when this returns.
pub async fn execute_with(
    request: &ExecRequest,
    streams: ExecStreams,
) -> Result<String, ExecFailure> {
    let prompt_line = request.show_prompt.then(|| {
        PromptContext::from_process().prompt_line(&request.prompt_format, &request.command)
    });

    let ExecStreams {
        input,
        display,
        dimensions,
        raw_mode,
    } = streams;
    let dimensions = dimensions.unwrap_or_else(terminal_dimensions);

    let mut session = PtySession::open(dimensions).map_err(ExecFailure::without_output)?;
    let reader = session.reader().map_err(ExecFailure::without_output)?;
    let env = child_env_from_process();
    let child = session
        .start(&request.command, &env)
        .map_err(ExecFailure::without_output)?;

    let _raw_mode = if raw_mode {
        RawModeGuard::acquire()
    } else {
        None
    };

    let capture = CaptureBuffer::new();
    let gate = session.output_gate();
    let output_done = match spawn_output_pump(reader, display, capture.clone(), gate) {
        Ok(done) => done,
        Err(err) => {
            kill_and_reap(child).await;
            return Err(ExecFailure::without_output(ExecError::ProcessStart(
                format!("failed to start output pump: {err}"),
            )));
        }
    };
    spawn_input_forwarder(input, session.writer());

    let outcome = supervise(child, request.timeout).await;
    session.close();

    let drain = wait_for_drain(output_done, DRAIN_GRACE_PERIOD).await;
    session.seal();
    let captured = decode_capture(&capture.snapshot(), drain);
    log::debug!(
        "command {:?} finished: {outcome:?}, drain {drain:?}, {} bytes captured",
        request.command,
        captured.len()
    );

    match outcome {
        WaitOutcome::Exited => Ok(assemble(prompt_line.as_deref(), &captured)),
        WaitOutcome::TimedOut if request.expect_timeout => {
            Ok(assemble(prompt_line.as_deref(), &captured))
        }
        WaitOutcome::TimedOut => Err(ExecFailure::new(
            captured,
            ExecError::TimeoutExceeded(request.timeout),
        )),
        WaitOutcome::Failed(reason) => Err(ExecFailure::new(
            captured,
            ExecError::ProcessExecution(reason),
        )),
    }
}

/// Prepend the prompt line to the cleaned output and drop trailing line
/// breaks.
pub fn assemble(prompt_line: Option<&str>, captured: &str) -> String {
    let mut result = prompt_line.unwrap_or_default().to_string();
    result.push_str(&clean_output(captured));
    result.trim_end_matches(['\n', '\r']).to_string()
}
