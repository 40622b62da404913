//! Create, update, and delete reconcilers plus the one-shot resource reader.
//!
//! Each reconciler binds the shared poll loop to one resource kind. An `Err`
//! from any `wait` means the surrounding mutation must be treated as failed
//! and local state must not be committed.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::api::{FetchError, ResourceId, ResourceKind, ResourceSnapshot};

use super::cancel::CancelToken;
use super::condition::{Condition, CreateCondition, DeleteCondition, UpdateCondition};
use super::error::{Operation, ReconcileError, WaitError};
use super::poll::{PollSettings, wait_for};
use super::tagger::OperationTag;

/// Waits for a newly created resource to become `provisioned`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreateReconciler {
    kind: ResourceKind,
    settings: PollSettings,
}

impl CreateReconciler {
    /// Creates a reconciler for resources of `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind, settings: PollSettings) -> Self {
        Self { kind, settings }
    }

    /// Polls `fetch` until the resource reports `provisioned`.
    ///
    /// Not-found reads count as `unknown` and keep the wait going, since a
    /// freshly created resource may not be visible yet.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on any other read error, on a status
    /// outside `provisioning`/`unknown`/`provisioned`, on timeout, and on
    /// cancellation.
    pub async fn wait<F, Fut>(
        &self,
        id: &ResourceId,
        cancel: &CancelToken,
        fetch: F,
    ) -> Result<ResourceSnapshot, ReconcileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
    {
        run(self.kind, id, &CreateCondition, &self.settings, cancel, fetch).await
    }
}

/// Waits for an update, identified by its operation tag, to become visible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpdateReconciler {
    kind: ResourceKind,
    settings: PollSettings,
}

impl UpdateReconciler {
    /// Creates a reconciler for resources of `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind, settings: PollSettings) -> Self {
        Self { kind, settings }
    }

    /// Polls `fetch` until a snapshot carries `tag`.
    ///
    /// Snapshots without the tag, including ones carrying tags of other
    /// updates, keep the wait going.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on the first read error (not-found
    /// included), on timeout, and on cancellation.
    pub async fn wait<F, Fut>(
        &self,
        id: &ResourceId,
        tag: &OperationTag,
        cancel: &CancelToken,
        fetch: F,
    ) -> Result<ResourceSnapshot, ReconcileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
    {
        let condition = UpdateCondition(tag.clone());
        run(self.kind, id, &condition, &self.settings, cancel, fetch).await
    }
}

/// Waits for a deleted resource to stop being found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeleteReconciler {
    kind: ResourceKind,
    settings: PollSettings,
}

impl DeleteReconciler {
    /// Creates a reconciler for resources of `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind, settings: PollSettings) -> Self {
        Self { kind, settings }
    }

    /// Polls `fetch` until it reports not-found.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on any read error other than not-found, on
    /// timeout, and on cancellation.
    pub async fn wait<F, Fut>(
        &self,
        id: &ResourceId,
        cancel: &CancelToken,
        fetch: F,
    ) -> Result<(), ReconcileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
    {
        run(self.kind, id, &DeleteCondition, &self.settings, cancel, fetch).await
    }
}

async fn run<C, F, Fut>(
    kind: ResourceKind,
    id: &ResourceId,
    condition: &C,
    settings: &PollSettings,
    cancel: &CancelToken,
    fetch: F,
) -> Result<C::Output, ReconcileError>
where
    C: Condition,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
{
    let operation = condition.operation();
    debug!(%kind, %id, ?operation, "waiting for resource");
    let result = wait_for(fetch, condition, settings, cancel)
        .await
        .into_result(condition, settings);
    match result {
        Ok(output) => {
            info!(%kind, %id, "resource {}", operation.past_participle());
            Ok(output)
        }
        Err(cause) => Err(failure(operation, kind, id, cause)),
    }
}

fn failure(operation: Operation, kind: ResourceKind, id: &ResourceId, cause: WaitError) -> ReconcileError {
    if let WaitError::Fetch(err) = &cause {
        log_response_body(err);
    }
    let error = ReconcileError {
        operation,
        kind,
        id: id.clone(),
        cause,
    };
    warn!(%kind, %id, summary = %error.summary(), "{}", error.detail());
    error
}

fn log_response_body(err: &FetchError) {
    if let Some(body) = err.response_body() {
        debug!(
            endpoint = err.endpoint().unwrap_or("API"),
            response_body = %String::from_utf8_lossy(body),
            "error response body"
        );
    }
}

/// Outcome of a one-shot read.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadOutcome {
    /// The resource exists.
    Found(ResourceSnapshot),
    /// The resource no longer exists and should be dropped from local state.
    Removed,
}

/// Reads a resource once, treating not-found as removal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResourceReader {
    kind: ResourceKind,
}

impl ResourceReader {
    /// Creates a reader for resources of `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }

    /// Fetches the resource once.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for any read error other than not-found.
    pub async fn read<F, Fut>(&self, id: &ResourceId, fetch: F) -> Result<ReadOutcome, ReconcileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResourceSnapshot, FetchError>>,
    {
        match fetch().await {
            Ok(snapshot) => Ok(ReadOutcome::Found(snapshot)),
            Err(err) if err.is_not_found() => {
                warn!(
                    kind = %self.kind,
                    %id,
                    "the {} with ID {id} was not found on the server and will be removed from state",
                    self.kind.name()
                );
                Ok(ReadOutcome::Removed)
            }
            Err(err) => Err(failure(Operation::Read, self.kind, id, WaitError::Fetch(err))),
        }
    }
}
