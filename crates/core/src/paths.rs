//! Mapping from a [`ResourceId`] to the places a copy of it may live.
//!
//! For an app `com.example.app` with base URL `https://example.com/livebundle`:
//!
//! ```text
//! <resources>/example.plist                                  bundled
//! <cache_root>/com.example.app/example.plist                 live
//! <cache_root>/com.example.app/example.plist.tmp             temp
//! https://example.com/livebundle/example.plist               remote
//! ```
//!
//! Everything here is deterministic. The only side effect is
//! [`PathResolver::ensure_live_root`], which creates the live directory.

use crate::bundle::BundleLookup;
use crate::error::{LiveBundleError, Result};
use crate::resource::ResourceId;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Appended to the live file name while a download is in progress. No plain
/// resource file name ends in it, so temp and live paths never collide.
pub const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePaths {
    pub bundled: Option<PathBuf>,
    pub live_root: PathBuf,
    pub live: PathBuf,
    pub temp: PathBuf,
}

pub fn live_cache_root(cache_root: &Path, namespace: &str) -> PathBuf {
    cache_root.join(namespace)
}

/// Callers check [`ResourceId::is_plain`] first; other names may point
/// outside `live_root`.
pub fn live_path(live_root: &Path, id: &ResourceId) -> PathBuf {
    live_root.join(id.file_name())
}

pub fn temp_path(live_root: &Path, id: &ResourceId) -> PathBuf {
    live_root.join(format!("{}.{}", id.file_name(), TEMP_SUFFIX))
}

/// `base/name.ext`. The file name is pushed as a single encoded path segment.
pub fn remote_locator(id: &ResourceId, base: Option<&Url>) -> Result<Url> {
    if !id.is_plain() {
        return Err(LiveBundleError::InvalidResource(id.clone()));
    }
    let base = base.ok_or_else(|| {
        LiveBundleError::InvalidConfiguration("no base URL configured".into())
    })?;

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            LiveBundleError::InvalidConfiguration(format!("{} cannot be a base URL", base))
        })?
        .pop_if_empty()
        .push(&id.file_name());
    Ok(url)
}

pub(crate) fn is_single_component(s: &str) -> bool {
    if s.chars().any(std::path::is_separator) {
        return false;
    }
    let mut components = Path::new(s).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Path arithmetic for one application namespace.
#[derive(Clone)]
pub struct PathResolver {
    bundle: Arc<dyn BundleLookup>,
    live_root: PathBuf,
    base_url: Option<Url>,
}

impl PathResolver {
    pub fn new(
        bundle: Arc<dyn BundleLookup>,
        cache_root: &Path,
        namespace: &str,
        base_url: Option<Url>,
    ) -> Result<Self> {
        if !is_single_component(namespace) {
            return Err(LiveBundleError::InvalidConfiguration(format!(
                "namespace {:?} must be a single directory name",
                namespace
            )));
        }

        Ok(Self {
            bundle,
            live_root: live_cache_root(cache_root, namespace),
            base_url,
        })
    }

    pub fn bundle(&self) -> &dyn BundleLookup {
        self.bundle.as_ref()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn bundled_path(&self, id: &ResourceId) -> Result<PathBuf> {
        if !id.is_plain() {
            return Err(LiveBundleError::NotFound(id.clone()));
        }
        self.bundle
            .lookup_packaged(id.name(), id.ext())
            .ok_or_else(|| LiveBundleError::NotFound(id.clone()))
    }

    pub fn live_root(&self) -> &Path {
        &self.live_root
    }

    /// Creates the live directory and its parents. Idempotent.
    pub fn ensure_live_root(&self) -> Result<&Path> {
        fs::create_dir_all(&self.live_root)?;
        Ok(&self.live_root)
    }

    pub fn live_path(&self, id: &ResourceId) -> PathBuf {
        live_path(&self.live_root, id)
    }

    pub fn temp_path(&self, id: &ResourceId) -> PathBuf {
        temp_path(&self.live_root, id)
    }

    pub fn remote_locator(&self, id: &ResourceId) -> Result<Url> {
        remote_locator(id, self.base_url.as_ref())
    }

    pub fn candidates(&self, id: &ResourceId) -> CandidatePaths {
        CandidatePaths {
            bundled: self.bundled_path(id).ok(),
            live_root: self.live_root.clone(),
            live: self.live_path(id),
            temp: self.temp_path(id),
        }
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("bundle", &self.bundle.identifier())
            .field("live_root", &self.live_root)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}
