//! Read-side abstraction the reconciliation engine polls.

use std::future::Future;
use std::pin::Pin;

use crate::api::{FetchError, ResourceSnapshot, ResourceTarget};

/// Future returned by a single snapshot fetch.
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResourceSnapshot, FetchError>> + Send + 'a>>;

/// Source of current resource snapshots.
///
/// Implementations perform exactly one read per call, with no batching and no
/// retry; not-found must be reported as a `404` [`FetchError::Api`].
pub trait ResourceFetcher {
    /// Fetches the current snapshot of `target`.
    fn fetch<'a>(&'a self, target: &'a ResourceTarget) -> FetchFuture<'a>;
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for &T {
    fn fetch<'a>(&'a self, target: &'a ResourceTarget) -> FetchFuture<'a> {
        (**self).fetch(target)
    }
}

/// Binds a fetcher to one target, producing the closure the reconcilers poll.
pub fn bind<'a, F>(fetcher: &'a F, target: &'a ResourceTarget) -> impl FnMut() -> FetchFuture<'a>
where
    F: ResourceFetcher + ?Sized,
{
    move || fetcher.fetch(target)
}
