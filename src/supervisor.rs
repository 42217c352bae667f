//! Waits for the child under the command timeout.

use std::time::Duration;

use portable_pty::{Child, ChildKiller, ExitStatus};
use tokio::task::JoinHandle;

use crate::pty::PtyChild;

/// How long a hung-up child gets to exit before it is sent `SIGKILL`, and
/// how long the reap waits after that.
const KILL_GRACE: Duration = Duration::from_millis(500);

type WaitTask = JoinHandle<std::io::Result<ExitStatus>>;

/// How the supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Exited with status zero before the deadline.
    Exited,
    /// Exited unsuccessfully, or its status could not be collected.
    Failed(String),
    /// The deadline passed first and the process was killed.
    TimedOut,
}

/// Wait for `child` to exit, killing it once `timeout` has elapsed.
pub async fn supervise(child: PtyChild, timeout: Duration) -> WaitOutcome {
    let killer = child.clone_killer();
    let pid = child.process_id();
    let mut wait = spawn_wait_task(child);

    match tokio::time::timeout(timeout, &mut wait).await {
        Ok(Ok(Ok(status))) if status.success() => WaitOutcome::Exited,
        Ok(Ok(Ok(status))) => {
            log::debug!("process exited with code {}", status.exit_code());
            WaitOutcome::Failed(format!("exit code {}", status.exit_code()))
        }
        Ok(Ok(Err(err))) => WaitOutcome::Failed(err.to_string()),
        Ok(Err(err)) => WaitOutcome::Failed(format!("wait task failed: {err}")),
        Err(_) => {
            log::debug!("process timed out after {}ms, killing", timeout.as_millis());
            stop(killer, pid, wait).await;
            WaitOutcome::TimedOut
        }
    }
}

/// Kill `child` and reap it without blocking the runtime.
pub async fn kill_and_reap(child: PtyChild) {
    let killer = child.clone_killer();
    let pid = child.process_id();
    stop(killer, pid, spawn_wait_task(child)).await;
}

fn spawn_wait_task(mut child: PtyChild) -> WaitTask {
    tokio::task::spawn_blocking(move || child.wait())
}

/// Hang up on the child, then force it if it is still running after
/// [`KILL_GRACE`].
async fn stop(
    mut killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    mut wait: WaitTask,
) {
    if let Err(err) = killer.kill() {
        log::warn!("failed to signal process: {err}");
    }
    if let Ok(reaped) = tokio::time::timeout(KILL_GRACE, &mut wait).await {
        log_reap(reaped);
        return;
    }

    log::debug!("process ignored hangup, sending SIGKILL");
    force_kill(pid);
    match tokio::time::timeout(KILL_GRACE, wait).await {
        Ok(reaped) => log_reap(reaped),
        Err(_) => log::warn!("process {pid:?} still running after SIGKILL"),
    }
}

fn log_reap(reaped: Result<std::io::Result<ExitStatus>, tokio::task::JoinError>) {
    match reaped {
        Ok(Ok(status)) => log::debug!("reaped process, exit code {}", status.exit_code()),
        Ok(Err(err)) => log::warn!("failed to reap process: {err}"),
        Err(err) => log::warn!("wait task failed: {err}"),
    }
}

#[cfg(unix)]
fn force_kill(pid: Option<u32>) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGKILL) {
        log::warn!("failed to kill process {pid}: {err}");
    }
}

#[cfg(not(unix))]
fn force_kill(_pid: Option<u32>) {}
