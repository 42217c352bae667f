//! Bounded wait for the output pump after the PTY is closed.

use std::time::Duration;

use crate::pump::OutputDone;

/// Fixed upper bound on how long to wait for remaining output once the
/// process is gone. Independent of the command timeout.
pub const DRAIN_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Whether the output pump finished within the grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    Complete,
    /// The pump was still running; the capture may end mid-sequence.
    Truncated,
}

/// Wait for the output pump to signal completion, giving up after `grace`.
pub async fn wait_for_drain(done: OutputDone, grace: Duration) -> DrainStatus {
    match tokio::time::timeout(grace, done).await {
        // A dropped sender means the pump thread is gone as well.
        Ok(_) => DrainStatus::Complete,
        Err(_) => {
            log::debug!(
                "output still open after {}ms grace period, continuing with partial capture",
                grace.as_millis()
            );
            DrainStatus::Truncated
        }
    }
}
