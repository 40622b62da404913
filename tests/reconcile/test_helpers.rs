//! Shared fixtures for reconciliation BDD scenarios.

use std::time::Duration;

use nscale_reconcile::test_support::ScriptedFetcher;
use nscale_reconcile::{PollSettings, ResourceKind};
use rstest::fixture;

#[derive(Clone, Debug)]
pub struct ReconcileContext {
    pub fetcher: ScriptedFetcher,
    pub kind: ResourceKind,
    pub settings: PollSettings,
    pub outcome: Option<ReconcileResult>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReconcileResult {
    Success,
    Failure { message: String, timed_out: bool },
}

pub const RESOURCE_ID: &str = "res-1";

#[fixture]
pub fn reconcile_context() -> ReconcileContext {
    ReconcileContext {
        fetcher: ScriptedFetcher::new(),
        kind: ResourceKind::Instance,
        settings: PollSettings::new(Duration::from_millis(1), Duration::from_secs(5)),
        outcome: None,
    }
}

pub fn parse_kind(label: &str) -> Option<ResourceKind> {
    match label {
        "instance" => Some(ResourceKind::Instance),
        "compute-cluster" => Some(ResourceKind::ComputeCluster),
        "network" => Some(ResourceKind::Network),
        "security-group" => Some(ResourceKind::SecurityGroup),
        "file-storage" => Some(ResourceKind::FileStorage),
        _ => None,
    }
}
