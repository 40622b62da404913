//! Error types for the reconciliation engine.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::api::{FetchError, ResourceId, ResourceKind};

/// The mutation a wait is tracking, or a plain read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Waiting for a newly created resource to provision.
    Create,
    /// Waiting for an update to be applied.
    Update,
    /// Waiting for a resource to disappear.
    Delete,
    /// One-shot read of the current state.
    Read,
}

impl Operation {
    /// Past participle used in messages (`created`, `updated`, ...).
    #[must_use]
    pub const fn past_participle(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::Read => "read",
        }
    }

    const fn title_participle(self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
            Self::Read => "Read",
        }
    }
}

/// Why a wait ended without reaching its target state.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError {
    /// A read failed in a way the current operation does not tolerate.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The resource reported a state outside the pending and target sets.
    #[error("unexpected state '{state}', wanted target '{target}'")]
    UnexpectedState {
        /// State reported by the control plane.
        state: String,
        /// Target states of the wait, comma separated.
        target: String,
    },
    /// The time budget elapsed before a terminal state was observed.
    #[error(
        "timeout while waiting for state to become '{target}' (last state: '{last_state}', timeout: {timeout:?})"
    )]
    TimedOut {
        /// Target states of the wait, comma separated.
        target: String,
        /// Last observed state, empty when no read completed.
        last_state: String,
        /// Configured time budget.
        timeout: Duration,
    },
    /// The caller cancelled the wait.
    #[error("wait cancelled (last state: '{last_state}')")]
    Cancelled {
        /// Last observed state, empty when no read completed.
        last_state: String,
    },
}

/// User-facing failure of a reconciler: the caller must not commit state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconcileError {
    /// Operation being awaited.
    pub operation: Operation,
    /// Kind of the resource.
    pub kind: ResourceKind,
    /// Identifier of the resource.
    pub id: ResourceId,
    /// Underlying cause.
    pub cause: WaitError,
}

impl ReconcileError {
    /// Short title, for example `Failed to Wait for Instance to be Created`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.operation {
            Operation::Read => format!("Failed to Read {}", self.kind.title()),
            Operation::Create | Operation::Update | Operation::Delete => format!(
                "Failed to Wait for {} to be {}",
                self.kind.title(),
                self.operation.title_participle()
            ),
        }
    }

    /// Detail sentence naming the resource and the underlying cause.
    #[must_use]
    pub fn detail(&self) -> String {
        match self.operation {
            Operation::Read => format!(
                "An error occurred while retrieving the {} {}: {}",
                self.kind.name(),
                self.id,
                self.cause
            ),
            Operation::Create | Operation::Update | Operation::Delete => format!(
                "An error occurred while waiting for the {} {} to be {}: {}",
                self.kind.name(),
                self.id,
                self.operation.past_participle(),
                self.cause
            ),
        }
    }

    /// Returns `true` when the wait ran out of time rather than failing.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.cause, WaitError::TimedOut { .. })
    }

    /// Returns `true` when the caller cancelled the wait.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.cause, WaitError::Cancelled { .. })
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary(), self.detail())
    }
}

impl StdError for ReconcileError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.cause)
    }
}
