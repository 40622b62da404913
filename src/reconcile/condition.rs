//! Per-tick evaluation of a fetch result against the awaited condition.
//!
//! Each condition names the payload its success carries: the final snapshot
//! for creates and updates, nothing for deletes.

use std::fmt;

use crate::api::{FetchError, ProvisioningStatus, ResourceSnapshot};

use super::error::{Operation, WaitError};
use super::tagger::{OperationTag, has_tag};

/// State label derived from one fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ObservedState {
    /// Provisioning status reported by (or assumed for) the resource.
    Status(ProvisioningStatus),
    /// The resource does not yet carry the awaited operation tag.
    Updating,
    /// The resource carries the awaited operation tag.
    Updated,
    /// The resource is still readable.
    Deleting,
    /// The resource is no longer found.
    Deleted,
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => f.write_str(status.as_str()),
            Self::Updating => f.write_str("updating"),
            Self::Updated => f.write_str("updated"),
            Self::Deleting => f.write_str("deleting"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

const CREATE_PENDING: &[ObservedState] = &[
    ObservedState::Status(ProvisioningStatus::Provisioning),
    ObservedState::Status(ProvisioningStatus::Unknown),
];
const CREATE_TARGET: &[ObservedState] =
    &[ObservedState::Status(ProvisioningStatus::Provisioned)];
const UPDATE_PENDING: &[ObservedState] = &[ObservedState::Updating];
const UPDATE_TARGET: &[ObservedState] = &[ObservedState::Updated];
const DELETE_PENDING: &[ObservedState] = &[ObservedState::Deleting];
const DELETE_TARGET: &[ObservedState] = &[ObservedState::Deleted];

/// Result of evaluating one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation<T> {
    /// Not terminal yet; poll again.
    Pending(ObservedState),
    /// A target state was reached.
    Succeeded {
        /// The target state observed.
        state: ObservedState,
        /// What the successful tick yields to the caller.
        output: T,
    },
    /// A terminal failure; stop polling.
    Failed(WaitError),
}

/// A condition the poll loop waits for.
pub trait Condition {
    /// Payload of a successful wait.
    type Output;

    /// Operation this condition belongs to.
    fn operation(&self) -> Operation;

    /// States that keep the wait polling.
    fn pending_states(&self) -> &'static [ObservedState];

    /// States that end the wait successfully.
    fn target_states(&self) -> &'static [ObservedState];

    /// Classifies one fetch result as pending, succeeded, or failed.
    fn evaluate(&self, fetched: Result<ResourceSnapshot, FetchError>) -> Evaluation<Self::Output>;

    /// Comma separated list of target states, for messages.
    fn describe_target(&self) -> String {
        self.target_states()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn classify<C: Condition + ?Sized>(
    condition: &C,
    state: ObservedState,
    output: C::Output,
) -> Evaluation<C::Output> {
    if condition.target_states().contains(&state) {
        return Evaluation::Succeeded { state, output };
    }
    if condition.pending_states().contains(&state) {
        return Evaluation::Pending(state);
    }
    Evaluation::Failed(WaitError::UnexpectedState {
        state: state.to_string(),
        target: condition.describe_target(),
    })
}

/// A new resource reaching `provisioned`; not-found counts as `unknown`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CreateCondition;

impl Condition for CreateCondition {
    type Output = ResourceSnapshot;

    fn operation(&self) -> Operation {
        Operation::Create
    }

    fn pending_states(&self) -> &'static [ObservedState] {
        CREATE_PENDING
    }

    fn target_states(&self) -> &'static [ObservedState] {
        CREATE_TARGET
    }

    fn evaluate(
        &self,
        fetched: Result<ResourceSnapshot, FetchError>,
    ) -> Evaluation<ResourceSnapshot> {
        match fetched {
            Ok(snapshot) => {
                let state = ObservedState::Status(snapshot.status().clone());
                classify(self, state, snapshot)
            }
            Err(err) if err.is_not_found() => {
                Evaluation::Pending(ObservedState::Status(ProvisioningStatus::Unknown))
            }
            Err(err) => Evaluation::Failed(WaitError::Fetch(err)),
        }
    }
}

/// An update carrying the given operation tag becoming visible.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateCondition(pub OperationTag);

impl Condition for UpdateCondition {
    type Output = ResourceSnapshot;

    fn operation(&self) -> Operation {
        Operation::Update
    }

    fn pending_states(&self) -> &'static [ObservedState] {
        UPDATE_PENDING
    }

    fn target_states(&self) -> &'static [ObservedState] {
        UPDATE_TARGET
    }

    fn evaluate(
        &self,
        fetched: Result<ResourceSnapshot, FetchError>,
    ) -> Evaluation<ResourceSnapshot> {
        match fetched {
            Ok(snapshot) => {
                let state = if has_tag(snapshot.tags(), &self.0) {
                    ObservedState::Updated
                } else {
                    ObservedState::Updating
                };
                classify(self, state, snapshot)
            }
            Err(err) => Evaluation::Failed(WaitError::Fetch(err)),
        }
    }
}

/// A resource no longer being found.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeleteCondition;

impl Condition for DeleteCondition {
    type Output = ();

    fn operation(&self) -> Operation {
        Operation::Delete
    }

    fn pending_states(&self) -> &'static [ObservedState] {
        DELETE_PENDING
    }

    fn target_states(&self) -> &'static [ObservedState] {
        DELETE_TARGET
    }

    fn evaluate(&self, fetched: Result<ResourceSnapshot, FetchError>) -> Evaluation<()> {
        match fetched {
            Ok(_) => classify(self, ObservedState::Deleting, ()),
            Err(err) if err.is_not_found() => classify(self, ObservedState::Deleted, ()),
            Err(err) => Evaluation::Failed(WaitError::Fetch(err)),
        }
    }
}
