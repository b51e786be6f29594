use livebundle_core::{LiveBundleError, PathResolver, ResourceId, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// The live cache directory, keyed by resource.
///
/// A file at a live path is always a complete download: bytes only ever
/// arrive there through [`CacheStore::promote`], which renames a finished
/// temp file into place.
#[derive(Debug, Clone)]
pub struct CacheStore {
    paths: Arc<PathResolver>,
}

impl CacheStore {
    pub fn new(paths: Arc<PathResolver>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn has_live(&self, id: &ResourceId) -> bool {
        self.paths.live_path(id).is_file()
    }

    /// Live copy if one was downloaded before, otherwise the bundled copy.
    /// Looks only at committed local state; never touches the network.
    /// Names that are not plain file names never have a local copy.
    pub fn best_local_path(&self, id: &ResourceId) -> Result<PathBuf> {
        if !id.is_plain() {
            return Err(LiveBundleError::ResourceUnavailable(id.clone()));
        }
        let live = self.paths.live_path(id);
        if live.is_file() {
            log::debug!("{} resolved to live copy {}", id, live.display());
            return Ok(live);
        }

        match self.paths.bundled_path(id) {
            Ok(bundled) => {
                log::debug!("{} resolved to bundled copy {}", id, bundled.display());
                Ok(bundled)
            }
            Err(LiveBundleError::NotFound(_)) => Err(LiveBundleError::ResourceUnavailable(id.clone())),
            Err(e) => Err(e),
        }
    }

    pub fn live_modified(&self, id: &ResourceId) -> Option<SystemTime> {
        fs::metadata(self.paths.live_path(id))
            .and_then(|m| m.modified())
            .ok()
    }

    /// Atomically replace `live` with `temp`. Readers of `live` see either
    /// the old file or the new one, never a partial write. `temp` is left in
    /// place when the rename fails.
    pub fn promote(&self, temp: &Path, live: &Path) -> Result<()> {
        fs::rename(temp, live).map_err(|source| LiveBundleError::PromotionFailed {
            temp: temp.to_path_buf(),
            live: live.to_path_buf(),
            source,
        })?;
        log::info!("promoted {}", live.display());
        Ok(())
    }

    /// Best-effort removal of an in-progress download.
    pub fn discard_temp(&self, temp: &Path) {
        match fs::remove_file(temp) {
            Ok(()) => log::debug!("discarded {}", temp.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not discard {}: {}", temp.display(), e),
        }
    }
}

/// Byte equality of two files. A missing `b` counts as different.
pub async fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let meta_b = match async_std::fs::metadata(b).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let meta_a = async_std::fs::metadata(a).await?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let (left, right) = futures::try_join!(async_std::fs::read(a), async_std::fs::read(b))?;
    Ok(left == right)
}
