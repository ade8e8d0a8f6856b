//! Waiting for a stopped service to settle.
//!
//! After the stop action is accepted the supervisor keeps the service in a
//! pending state until its stop program finishes. [`wait_for_stop`] polls
//! fresh snapshots until the target leaves that state, disappears, or the
//! time budget runs out.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FailureCause;
use crate::options::CallOptions;
use crate::status::Status;

const STOP_TARGET: &str = "vigil_monit::stop";

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Default ceiling on the whole wait.
pub const DEFAULT_STOP_CEILING: Duration = Duration::from_secs(300);

/// Cadence and ceiling of the stop-completion wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    interval: Duration,
    ceiling: Duration,
}

impl PollSettings {
    /// Polls every `interval` for at most `ceiling`.
    #[must_use]
    pub const fn new(interval: Duration, ceiling: Duration) -> Self {
        Self { interval, ceiling }
    }

    /// Delay between polls.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on the wait.
    #[must_use]
    pub const fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_STOP_CEILING)
    }
}

/// Terminal state of the wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The service is present, idle, and reports no failure.
    Stopped,
    /// The service is idle but reports a failure.
    Errored {
        /// Supervisor's status message, verbatim.
        message: String,
    },
    /// The service is absent from the snapshot.
    NotFound,
}

/// Result of inspecting one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StopCheck {
    /// A terminal state was reached.
    Settled(StopOutcome),
    /// The supervisor still has an action queued; keep polling.
    Continue,
}

/// Classifies `service` within one snapshot.
pub(crate) fn check_stop_snapshot(status: &Status, service: &str) -> StopCheck {
    let Some(entry) = status.service(service) else {
        return StopCheck::Settled(StopOutcome::NotFound);
    };
    if entry.pending() {
        return StopCheck::Continue;
    }
    if entry.errored() {
        return StopCheck::Settled(StopOutcome::Errored {
            message: entry.status_message().to_owned(),
        });
    }
    StopCheck::Settled(StopOutcome::Stopped)
}

/// Polls `fetch` until `service` settles.
///
/// Cancellation and the caller's deadline are checked before every fetch;
/// the configured ceiling is applied on top. The options handed to `fetch`
/// carry the tighter of the two bounds so no single request outlives the
/// wait. A fetch failure aborts the wait.
///
/// # Errors
///
/// Returns `Canceled`, `Timeout`, or `StopTimeout` when the budget runs out,
/// and whatever `fetch` returns when a status query fails.
pub(crate) fn wait_for_stop<F>(
    service: &str,
    mut fetch: F,
    settings: &PollSettings,
    options: &CallOptions,
) -> Result<StopOutcome, FailureCause>
where
    F: FnMut(&CallOptions) -> Result<Status, FailureCause>,
{
    let ceiling = Instant::now() + settings.ceiling();
    let end = options
        .deadline()
        .map_or(ceiling, |deadline| deadline.min(ceiling));
    let bounded = options.clone().with_deadline(end);
    let mut attempt: u32 = 0;
    loop {
        options.check()?;
        if Instant::now() >= ceiling {
            debug!(target: STOP_TARGET, service, attempt, "stop ceiling reached");
            return Err(ceiling_exceeded(settings));
        }
        attempt = attempt.saturating_add(1);
        let status = match fetch(&bounded) {
            Ok(status) => status,
            // The bounded deadline expired but the caller's did not.
            Err(FailureCause::Timeout) if options.check().is_ok() => {
                return Err(ceiling_exceeded(settings));
            }
            Err(error) => return Err(error),
        };
        let check = check_stop_snapshot(&status, service);
        debug!(
            target: STOP_TARGET,
            service,
            attempt,
            outcome = ?check,
            "polled service status"
        );
        if let StopCheck::Settled(outcome) = check {
            return Ok(outcome);
        }
        let remaining = end.saturating_duration_since(Instant::now());
        thread::sleep(settings.interval().min(remaining));
    }
}

const fn ceiling_exceeded(settings: &PollSettings) -> FailureCause {
    FailureCause::StopTimeout {
        timeout: settings.ceiling(),
    }
}
