use crate::error::{LiveBundleError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Settings file looked up in the main bundle's packaged-resources root.
pub const SETTINGS_FILE: &str = "livebundle.toml";

/// Directory under the platform data dir that holds every app's live cache.
pub const LIVE_BUNDLES_DIR: &str = "LiveBundles";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "LIVEBUNDLE_URL";
pub const ENV_HOME: &str = "LIVEBUNDLE_HOME";
pub const ENV_NAMESPACE: &str = "LIVEBUNDLE_NAMESPACE";
pub const ENV_TIMEOUT_SECS: &str = "LIVEBUNDLE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveBundleConfig {
    /// Base URL checked for updated copies of bundled resources.
    pub url: Option<String>,
    /// Root shared by all applications' live caches.
    pub cache_root: Option<PathBuf>,
    /// Per-application directory under `cache_root`. Defaults to the bundle identifier.
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LiveBundleConfig {
    fn default() -> Self {
        Self {
            url: None,
            cache_root: None,
            namespace: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LiveBundleConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults, then `livebundle.toml` from `resources_root` if present, then
    /// the process environment.
    pub fn load(resources_root: &Path) -> Result<Self> {
        let mut config = Self::load_file(resources_root)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_file(resources_root: &Path) -> Result<Self> {
        let settings_path = resources_root.join(SETTINGS_FILE);
        if settings_path.is_file() {
            let content = fs::read_to_string(settings_path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlay values from an environment lookup. Unparseable timeouts are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.url = Some(url);
        }
        if let Some(home) = lookup(ENV_HOME) {
            self.cache_root = Some(PathBuf::from(home));
        }
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            self.namespace = Some(namespace);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => log::warn!("ignoring {}={:?}: not a number", ENV_TIMEOUT_SECS, secs),
            }
        }
    }

    /// The parsed base URL. Only absolute http(s) URLs are accepted.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LiveBundleError::InvalidConfiguration("no base URL configured".into()))?;

        let url = Url::parse(raw).map_err(|e| {
            LiveBundleError::InvalidConfiguration(format!("base URL {:?}: {}", raw, e))
        })?;

        match url.scheme() {
            "http" | "https" if !url.cannot_be_a_base() => Ok(url),
            _ => Err(LiveBundleError::InvalidConfiguration(format!(
                "base URL {:?} is not an http(s) location",
                raw
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_root {
            Some(root) => Ok(root.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(LIVE_BUNDLES_DIR))
                .ok_or_else(|| {
                    LiveBundleError::InvalidConfiguration(
                        "could not find an application data directory".into(),
                    )
                }),
        }
    }

    pub fn namespace_or<'a>(&'a self, bundle_identifier: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(bundle_identifier)
    }
}
