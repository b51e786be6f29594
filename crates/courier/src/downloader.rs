use crate::store::{same_contents, CacheStore};
use crate::transport::{FetchOutcome, Transport};
use livebundle_core::{LiveBundleError, NotificationBus, ResourceId, UpdateEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How a check-and-update cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new copy was promoted to this live path and announced.
    Updated(PathBuf),
    /// The remote copy matches the live one; nothing was promoted.
    Unchanged,
    /// No check was attempted, e.g. because no base URL is configured.
    Skipped(String),
    /// The attempt was abandoned. The live cache is untouched.
    Failed(String),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

/// Runs the fetch, compare, promote and notify steps for one resource.
pub struct Downloader {
    store: CacheStore,
    transport: Arc<dyn Transport>,
    bus: NotificationBus,
    timeout: Duration,
}

impl Downloader {
    pub fn new(
        store: CacheStore,
        transport: Arc<dyn Transport>,
        bus: NotificationBus,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            bus,
            timeout,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Never fails: every problem is logged and reported in the outcome.
    pub async fn check_and_update(&self, id: &ResourceId) -> UpdateOutcome {
        let paths = self.store.paths();
        let url = match paths.remote_locator(id) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("not checking {}: {}", id, e);
                return UpdateOutcome::Skipped(e.to_string());
            }
        };
        if let Err(e) = paths.ensure_live_root() {
            log::warn!("not checking {}: {}", id, e);
            return UpdateOutcome::Failed(e.to_string());
        }

        let live = paths.live_path(id);
        let temp = paths.temp_path(id);
        let since = self.store.live_modified(id);

        log::debug!("checking {} for {}", url, id);
        let fetched = async_std::future::timeout(
            self.timeout,
            self.transport.fetch(&url, since, &temp),
        )
        .await
        .unwrap_or(Err(LiveBundleError::Timeout(self.timeout)));

        match fetched {
            Ok(FetchOutcome::Downloaded { bytes }) => {
                log::debug!("downloaded {} bytes for {}", bytes, id);
            }
            Ok(FetchOutcome::NotModified) => {
                self.store.discard_temp(&temp);
                return UpdateOutcome::Unchanged;
            }
            Err(e) => {
                log::warn!("update check for {} abandoned: {}", id, e);
                self.store.discard_temp(&temp);
                return UpdateOutcome::Failed(e.to_string());
            }
        }

        match same_contents(&temp, &live).await {
            Ok(true) => {
                log::debug!("{} is unchanged", id);
                self.store.discard_temp(&temp);
                return UpdateOutcome::Unchanged;
            }
            Ok(false) => {}
            Err(e) => log::warn!("could not compare {} with live copy, replacing it: {}", id, e),
        }

        if let Err(e) = self.store.promote(&temp, &live) {
            log::warn!("update for {} dropped: {}", id, e);
            self.store.discard_temp(&temp);
            return UpdateOutcome::Failed(e.to_string());
        }

        log::info!("{} updated at {}", id, live.display());
        self.bus.publish(UpdateEvent::new(id.clone(), live.clone()));
        UpdateOutcome::Updated(live)
    }
}
