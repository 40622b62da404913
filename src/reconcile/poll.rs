//! The shared polling loop behind every reconciler.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tracing::debug;

use crate::api::{FetchError, ResourceSnapshot};

use super::cancel::CancelToken;
use super::condition::{Condition, Evaluation, ObservedState};
use super::error::WaitError;

/// Default pause between two reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound on a single wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Deadline used when a timeout is too large to be added to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Cadence and time budget of a wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSettings {
    /// Pause between the end of one read and the start of the next.
    pub interval: Duration,
    /// Maximum cumulative wait.
    pub timeout: Duration,
}

impl PollSettings {
    /// Builds settings from an interval and a timeout.
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }
}

/// Terminal result of [`wait_for`].
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome<T> {
    /// A target state was observed.
    Succeeded(T),
    /// A tick produced a fatal error.
    Failed(WaitError),
    /// The time budget elapsed while still pending.
    TimedOut {
        /// Last pending state observed.
        last_state: Option<ObservedState>,
    },
    /// The caller cancelled the wait.
    Cancelled {
        /// Last pending state observed.
        last_state: Option<ObservedState>,
    },
}

impl<T> PollOutcome<T> {
    /// Folds the outcome into a result, turning timeout and cancellation
    /// into [`WaitError`] values.
    ///
    /// # Errors
    ///
    /// Returns the [`WaitError`] describing any non-successful outcome.
    pub fn into_result<C: Condition + ?Sized>(
        self,
        condition: &C,
        settings: &PollSettings,
    ) -> Result<T, WaitError> {
        match self {
            Self::Succeeded(output) => Ok(output),
            Self::Failed(err) => Err(err),
            Self::TimedOut { last_state } => Err(WaitError::TimedOut {
                target: condition.describe_target(),
                last_state: label(last_state.as_ref()),
                timeout: settings.timeout,
            }),
            Self::Cancelled { last_state } => Err(WaitError::Cancelled {
                last_state: label(last_state.as_ref()),
            }),
        }
    }
}

fn label(state: Option<&ObservedState>) -> String {
    state.map(ToString::to_string).unwrap_or_default()
}

/// Polls `fetch` until `condition` reaches a terminal state, the time budget
/// elapses, or `cancel` fires.
///
/// The first read happens immediately. A read that is in flight when
/// cancellation is requested is allowed to finish; the loop returns right
/// after it. A read still in flight at the deadline is abandoned. Fatal
/// evaluations end the loop without another read.
pub async fn wait_for<C, F, Fut>(
    mut fetch: F,
    condition: &C,
    settings: &PollSettings,
    cancel: &CancelToken,
) -> PollOutcome<C::Output>
where
    C: Condition + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
{
    let start = Instant::now();
    let deadline = start
        .checked_add(settings.timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let mut last_state = None;
    let mut tick: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled { last_state };
        }

        tick = tick.saturating_add(1);
        let Ok(fetched) = timeout_at(deadline, fetch()).await else {
            debug!(tick, "read still in flight at the deadline");
            return PollOutcome::TimedOut { last_state };
        };
        match condition.evaluate(fetched) {
            Evaluation::Succeeded { state, output } => {
                debug!(tick, %state, "target state reached");
                return PollOutcome::Succeeded(output);
            }
            Evaluation::Failed(err) => {
                debug!(tick, error = %err, "wait failed");
                return PollOutcome::Failed(err);
            }
            Evaluation::Pending(state) => {
                debug!(tick, %state, "still pending");
                last_state = Some(state);
            }
        }

        if cancel.is_cancelled() {
            return PollOutcome::Cancelled { last_state };
        }
        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut { last_state };
        }

        let pause = settings
            .interval
            .min(deadline.saturating_duration_since(now));
        tokio::select! {
            () = sleep(pause) => {}
            () = cancel.cancelled() => return PollOutcome::Cancelled { last_state },
        }
    }
}
