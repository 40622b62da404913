//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::api::{
    ApiError, FetchError, ProvisioningStatus, ResourceMetadata, ResourceSnapshot, ResourceTarget,
    Tag,
};
use crate::fetcher::{FetchFuture, ResourceFetcher};

/// Builds a snapshot with the given identifier, status, and tag names.
#[must_use]
pub fn snapshot(id: &str, status: &str, tag_names: &[&str]) -> ResourceSnapshot {
    let tags = tag_names
        .iter()
        .map(|name| Tag::new(*name, "2025-01-01T00:00:00Z"))
        .collect();
    ResourceSnapshot::from_metadata(ResourceMetadata {
        id: id.to_owned(),
        name: format!("{id}-name"),
        provisioning_status: ProvisioningStatus::from(status),
        tags: Some(tags),
    })
}

/// Fetcher that replays pre-seeded results in FIFO order.
///
/// Once the script is exhausted every further call fails with a transport
/// error, so a loop that polls too often fails loudly.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFetcher {
    responses: Arc<Mutex<VecDeque<Result<ResourceSnapshot, FetchError>>>>,
    calls: Arc<Mutex<Vec<Option<ResourceTarget>>>>,
}

impl ScriptedFetcher {
    /// Creates a fetcher with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful read.
    pub fn push_snapshot(&self, snapshot: ResourceSnapshot) {
        self.push(Ok(snapshot));
    }

    /// Queues a snapshot of resource `id` reporting `status` with no tags.
    pub fn push_status(&self, id: &str, status: &str) {
        self.push_snapshot(snapshot(id, status, &[]));
    }

    /// Queues a snapshot of resource `id` carrying the named tags.
    pub fn push_tags(&self, id: &str, tag_names: &[&str]) {
        self.push_snapshot(snapshot(id, "provisioned", tag_names));
    }

    /// Queues a `404 Not Found` response.
    pub fn push_not_found(&self) {
        self.push(Err(FetchError::not_found("resource not found")));
    }

    /// Queues an API error with the given status code.
    pub fn push_api_error(&self, status_code: u16, message: &str) {
        self.push(Err(ApiError::with_status(status_code, message).into()));
    }

    /// Queues an arbitrary result.
    pub fn push(&self, result: Result<ResourceSnapshot, FetchError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Number of reads performed so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of queued responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Targets passed through [`ResourceFetcher::fetch`], in call order.
    /// Reads made through [`Self::next_result`] record `None`.
    #[must_use]
    pub fn targets(&self) -> Vec<Option<ResourceTarget>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pops the next scripted result, recording the call.
    pub fn next_result(&self) -> Ready<Result<ResourceSnapshot, FetchError>> {
        ready(self.record(None))
    }

    fn record(&self, target: Option<ResourceTarget>) -> Result<ResourceSnapshot, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::Transport {
                    endpoint: String::from("scripted"),
                    message: String::from("no scripted response available"),
                })
            })
    }
}

impl ResourceFetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, target: &'a ResourceTarget) -> FetchFuture<'a> {
        let result = self.record(Some(target.clone()));
        Box::pin(ready(result))
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and removes environment variables while holding a global mutex.
    ///
    /// Pairs with a `None` value are removed for the guard's lifetime.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
