//! BDD step definitions for the reconcilers.

use std::time::Duration;

use nscale_reconcile::{
    CancelToken, CreateReconciler, DeleteReconciler, OperationTag, PollSettings, ReconcileError,
    ResourceId, ResourceTarget, UpdateReconciler, bind,
};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{RESOURCE_ID, ReconcileContext, ReconcileResult, parse_kind};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a reconciliation context for a \"{kind}\"")]
fn context_for_kind(
    reconcile_context: ReconcileContext,
    kind: String,
) -> Result<ReconcileContext, StepError> {
    let parsed = parse_kind(&kind).ok_or(StepError::UnknownKind(kind))?;
    Ok(ReconcileContext {
        kind: parsed,
        ..reconcile_context
    })
}

#[given("the wait budget is \"{millis}\" milliseconds")]
fn wait_budget(reconcile_context: ReconcileContext, millis: u64) -> ReconcileContext {
    ReconcileContext {
        settings: PollSettings::new(Duration::from_millis(50), Duration::from_millis(millis)),
        ..reconcile_context
    }
}

#[given("the control plane reports not found")]
fn reports_not_found(reconcile_context: ReconcileContext) -> ReconcileContext {
    reconcile_context.fetcher.push_not_found();
    reconcile_context
}

#[given("the control plane reports status \"{status}\"")]
fn reports_status(reconcile_context: ReconcileContext, status: String) -> ReconcileContext {
    reconcile_context.fetcher.push_status(RESOURCE_ID, &status);
    reconcile_context
}

#[given("the control plane reports no tags")]
fn reports_no_tags(reconcile_context: ReconcileContext) -> ReconcileContext {
    reconcile_context.fetcher.push_tags(RESOURCE_ID, &[]);
    reconcile_context
}

#[given("the control plane reports tags \"{names}\"")]
fn reports_tags(reconcile_context: ReconcileContext, names: String) -> ReconcileContext {
    let tags: Vec<&str> = names.split(',').map(str::trim).collect();
    reconcile_context.fetcher.push_tags(RESOURCE_ID, &tags);
    reconcile_context
}

#[given("the control plane fails with status \"{code}\"")]
fn fails_with_status(reconcile_context: ReconcileContext, code: u16) -> ReconcileContext {
    reconcile_context
        .fetcher
        .push_api_error(code, "simulated server failure");
    reconcile_context
}

#[when("I wait for the resource to be created")]
fn wait_for_create(reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let target = ResourceTarget::new(reconcile_context.kind, RESOURCE_ID);
    let reconciler = CreateReconciler::new(reconcile_context.kind, reconcile_context.settings);
    let fetcher = reconcile_context.fetcher.clone();
    let result = block_on(async {
        reconciler
            .wait(&target.id, &CancelToken::never(), bind(&fetcher, &target))
            .await
            .map(|_| ())
    })?;
    Ok(with_outcome(reconcile_context, result))
}

#[when("I wait for the update tagged \"{tag}\"")]
fn wait_for_update(
    reconcile_context: ReconcileContext,
    tag: String,
) -> Result<ReconcileContext, StepError> {
    let target = ResourceTarget::new(reconcile_context.kind, RESOURCE_ID);
    let reconciler = UpdateReconciler::new(reconcile_context.kind, reconcile_context.settings);
    let fetcher = reconcile_context.fetcher.clone();
    let operation_tag = OperationTag::new(tag);
    let result = block_on(async {
        reconciler
            .wait(
                &target.id,
                &operation_tag,
                &CancelToken::never(),
                bind(&fetcher, &target),
            )
            .await
            .map(|_| ())
    })?;
    Ok(with_outcome(reconcile_context, result))
}

#[when("I wait for the resource to be deleted")]
fn wait_for_delete(reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let id = ResourceId::from(RESOURCE_ID);
    let reconciler = DeleteReconciler::new(reconcile_context.kind, reconcile_context.settings);
    let fetcher = reconcile_context.fetcher.clone();
    let result = block_on(async {
        reconciler
            .wait(&id, &CancelToken::never(), || fetcher.next_result())
            .await
    })?;
    Ok(with_outcome(reconcile_context, result))
}

#[then("the wait succeeds after \"{reads}\" reads")]
fn wait_succeeds(reconcile_context: &ReconcileContext, reads: usize) -> Result<(), StepError> {
    match &reconcile_context.outcome {
        Some(ReconcileResult::Success) => expect_reads(reconcile_context, reads),
        Some(ReconcileResult::Failure { message, .. }) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the wait fails after \"{reads}\" reads")]
fn wait_fails(reconcile_context: &ReconcileContext, reads: usize) -> Result<(), StepError> {
    let _ = failure_message(reconcile_context)?;
    expect_reads(reconcile_context, reads)
}

#[then("the wait times out")]
fn wait_times_out(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    match &reconcile_context.outcome {
        Some(ReconcileResult::Failure {
            timed_out: true, ..
        }) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a timeout, got {other:?}"
        ))),
    }
}

#[then("the failure mentions \"{fragment}\"")]
fn failure_mentions(
    reconcile_context: &ReconcileContext,
    fragment: String,
) -> Result<(), StepError> {
    let message = failure_message(reconcile_context)?;
    if message.contains(&fragment) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure to mention {fragment:?}, got {message:?}"
        )))
    }
}

fn block_on<F>(future: F) -> Result<Result<(), ReconcileError>, StepError>
where
    F: std::future::Future<Output = Result<(), ReconcileError>>,
{
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    Ok(runtime.block_on(future))
}

fn with_outcome(
    reconcile_context: ReconcileContext,
    result: Result<(), ReconcileError>,
) -> ReconcileContext {
    let outcome = match result {
        Ok(()) => ReconcileResult::Success,
        Err(err) => ReconcileResult::Failure {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        },
    };
    ReconcileContext {
        outcome: Some(outcome),
        ..reconcile_context
    }
}

fn expect_reads(reconcile_context: &ReconcileContext, reads: usize) -> Result<(), StepError> {
    let calls = reconcile_context.fetcher.calls();
    if calls == reads {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {reads} reads, observed {calls}"
        )))
    }
}

fn failure_message(reconcile_context: &ReconcileContext) -> Result<&str, StepError> {
    match &reconcile_context.outcome {
        Some(ReconcileResult::Failure { message, .. }) => Ok(message),
        other => Err(StepError::Assertion(format!(
            "expected a failure, got {other:?}"
        ))),
    }
}
