//! # livebundle-stem
//!
//! The resolution orchestrator. It answers path lookups from local state
//! straight away and dispatches each resource's check-and-update cycle at
//! most once, as a background task on the async-std executor.

use async_std::task::{self, JoinHandle};
use livebundle_core::{NotificationBus, PathResolver, ResourceId, Result};
use livebundle_courier::{CacheStore, Downloader, Transport, UpdateOutcome};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Resources whose check-and-update cycle has been dispatched during this
/// orchestrator's lifetime. Entries are never removed.
#[derive(Debug, Default)]
pub struct InFlightSet {
    ids: Mutex<HashSet<ResourceId>>,
}

impl InFlightSet {
    fn lock(&self) -> MutexGuard<'_, HashSet<ResourceId>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-insert under one lock. Only the first caller per id gets `true`.
    pub fn try_claim(&self, id: &ResourceId) -> bool {
        self.lock().insert(id.clone())
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Completion handle for a dispatched cycle. Dropping it detaches the task.
pub struct UpdateHandle {
    resource: ResourceId,
    task: JoinHandle<UpdateOutcome>,
}

impl UpdateHandle {
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub async fn outcome(self) -> UpdateOutcome {
        self.task.await
    }
}

impl std::fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateHandle")
            .field("resource", &self.resource)
            .finish()
    }
}

#[derive(Debug)]
pub struct Resolution {
    /// Best local path at the time of the call.
    pub path: Result<PathBuf>,
    /// Present only when this call dispatched the resource's update cycle.
    pub update: Option<UpdateHandle>,
}

/// Entry point: hands out local paths right away and starts at most one
/// background update per resource.
///
/// Create one per application and share it; the "once per resource" rule is
/// scoped to the orchestrator, not to the process.
pub struct Orchestrator {
    store: CacheStore,
    downloader: Arc<Downloader>,
    in_flight: InFlightSet,
    bus: NotificationBus,
}

impl Orchestrator {
    pub fn new(
        paths: Arc<PathResolver>,
        transport: Arc<dyn Transport>,
        bus: NotificationBus,
        timeout: Duration,
    ) -> Self {
        if paths.base_url().is_none() {
            log::warn!(
                "no base URL configured for {}; live updates are disabled",
                paths.bundle().identifier()
            );
        }

        let store = CacheStore::new(paths);
        let downloader = Downloader::new(store.clone(), transport, bus.clone(), timeout);
        Self {
            store,
            downloader: Arc::new(downloader),
            in_flight: InFlightSet::default(),
            bus,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub fn dispatched(&self, id: &ResourceId) -> bool {
        self.in_flight.contains(id)
    }

    /// Best local path for `id`; the first call per resource also starts a
    /// background update check. Fails only with `ResourceUnavailable` when
    /// there is neither a bundled nor a cached copy. Names that are not a
    /// plain file name are always unavailable and never dispatched.
    pub fn resolve(&self, id: &ResourceId) -> Result<PathBuf> {
        self.resolve_tracked(id).path
    }

    pub fn resolve_tracked(&self, id: &ResourceId) -> Resolution {
        let path = self.store.best_local_path(id);
        if !id.is_plain() {
            log::warn!("{:?} is not a plain file name; not checking for updates", id.file_name());
            return Resolution { path, update: None };
        }

        let update = if self.in_flight.try_claim(id) {
            Some(self.dispatch(id.clone()))
        } else {
            log::debug!("update for {} already dispatched", id);
            None
        };

        Resolution { path, update }
    }

    fn dispatch(&self, id: ResourceId) -> UpdateHandle {
        log::debug!("dispatching update check for {}", id);
        let downloader = self.downloader.clone();
        let resource = id.clone();
        let task = task::spawn(async move { downloader.check_and_update(&id).await });
        UpdateHandle { resource, task }
    }
}
