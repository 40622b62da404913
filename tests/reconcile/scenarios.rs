//! BDD scenarios for the reconcilers.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ReconcileContext, reconcile_context};

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A created instance becomes visible after transient not-found reads"
)]
fn scenario_create_absorbs_not_found(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "An update is confirmed only by its own operation tag"
)]
fn scenario_update_waits_for_own_tag(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A deleted resource disappears"
)]
fn scenario_delete_completes(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A fatal error during deletion stops the wait"
)]
fn scenario_delete_fatal_error(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A create that never settles times out"
)]
fn scenario_create_times_out(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}
