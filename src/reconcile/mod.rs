//! Reconciliation engine: waiting for asynchronously applied mutations to
//! become observable on an eventually consistent control plane.
//!
//! A mutation is submitted once, then one of the reconcilers polls a fetch
//! closure bound to the resource until the mutation is visible, a fatal
//! error occurs, the time budget runs out, or the caller cancels. The engine
//! only reads; it never writes to the remote resource.

mod cancel;
mod condition;
mod error;
mod poll;
mod tagger;
mod watcher;

pub use cancel::{CancelHandle, CancelToken, cancellation};
pub use condition::{
    Condition, CreateCondition, DeleteCondition, Evaluation, ObservedState, UpdateCondition,
};
pub use error::{Operation, ReconcileError, WaitError};
pub use poll::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, PollOutcome, PollSettings, wait_for};
pub use tagger::{
    DEFAULT_OPERATION_TAG_MAX_AGE, OPERATION_TAG_PREFIX, OperationTag, ReservedTagError, has_tag,
    stamp, stamp_at, strip_reserved_tags, strip_reserved_tags_at, strip_snapshot_tags,
    validate_user_tags,
};
pub use watcher::{
    CreateReconciler, DeleteReconciler, ReadOutcome, ResourceReader, UpdateReconciler,
};

#[cfg(test)]
mod tests;
