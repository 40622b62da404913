//! Reconciliation engine for Nscale-managed resources.
//!
//! After a create, update, or delete request has been accepted by the Nscale
//! control plane, the reconcilers in [`reconcile`] poll the resource until the
//! mutation is observable. [`api::NscaleClient`] provides the read path and
//! [`config::NscaleConfig`] the connection and polling settings.

pub mod api;
pub mod config;
pub mod fetcher;
pub mod reconcile;
pub mod test_support;

pub use api::{
    ApiError, ClientError, FetchError, NscaleClient, ProvisioningStatus, ResourceId, ResourceKind,
    ResourceSnapshot, ResourceTarget, Tag,
};
pub use config::{ConfigError, NscaleConfig};
pub use fetcher::{FetchFuture, ResourceFetcher, bind};
pub use reconcile::{
    CancelHandle, CancelToken, CreateReconciler, DeleteReconciler, OperationTag, PollSettings,
    ReadOutcome, ReconcileError, ResourceReader, UpdateReconciler, WaitError, cancellation,
};
