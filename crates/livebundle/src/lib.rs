//! # livebundle
//!
//! **Ship static resources with your application, update them after release.**
//!
//! Resolving a resource returns a local path immediately: the previously
//! downloaded live copy if there is one, otherwise the copy packaged with the
//! application. The first resolution of each resource also starts a
//! background check against the configured base URL. A newer copy is
//! downloaded into the live cache, announced on the notification bus, and
//! preferred by every later resolution.
//!
//! ```text
//! Example.app/Contents/Resources/example.plist
//! -> ~/Library/Application Support/LiveBundles/com.example.app/example.plist
//! -> https://example.com/livebundle/example.plist
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use livebundle::{DirBundle, LiveBundle};
//!
//! fn main() -> anyhow::Result<()> {
//!     // Reads `url = "https://example.com/livebundle"` from
//!     // Resources/livebundle.toml, or LIVEBUNDLE_URL from the environment.
//!     let bundle = LiveBundle::open(DirBundle::new(
//!         "com.example.app",
//!         "Example.app/Contents/Resources",
//!     ))?;
//!
//!     bundle.subscribe(|event| {
//!         println!("{} now at {}", event.resource, event.live_path.display());
//!     });
//!
//!     let path = bundle.resolve("example", "plist")?;
//!     println!("using {}", path.display());
//!     Ok(())
//! }
//! ```

use anyhow::Context;
use futures::channel::mpsc;
use livebundle_core::{BundleLookup, NotificationBus, PathResolver};
use livebundle_courier::SurfTransport;
use livebundle_stem::Orchestrator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use livebundle_core::{
    BundleSet, CandidatePaths, DirBundle, LiveBundleConfig, LiveBundleError, ResourceId,
    SubscriptionToken, UpdateEvent, Url, RESOURCE_UPDATED,
};
pub use livebundle_courier::{FetchOutcome, Transport, UpdateOutcome};
pub use livebundle_stem::{Resolution, UpdateHandle};

pub struct LiveBundleBuilder {
    bundles: BundleSet,
    config: Option<LiveBundleConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl LiveBundleBuilder {
    pub fn framework(mut self, framework: DirBundle) -> Self {
        self.bundles = self.bundles.with_framework(framework);
        self
    }

    /// Use these settings instead of reading `livebundle.toml` and the environment.
    pub fn config(mut self, config: LiveBundleConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> anyhow::Result<LiveBundle> {
        let config = match self.config {
            Some(config) => config,
            None => LiveBundleConfig::load(self.bundles.main().resources_root())
                .context("loading livebundle settings")?,
        };

        let base_url = match config.base_url() {
            Ok(url) => Some(url),
            Err(e) => {
                if config.url.is_some() {
                    log::warn!("ignoring base URL: {}", e);
                }
                None
            }
        };

        let cache_root = config.cache_root().context("locating the live cache root")?;
        let namespace = config.namespace_or(self.bundles.identifier()).to_string();
        let paths = PathResolver::new(
            Arc::new(self.bundles.clone()),
            &cache_root,
            &namespace,
            base_url,
        )
        .context("setting up live cache paths")?;

        if let Err(e) = paths.ensure_live_root() {
            log::warn!("could not create {}: {}", paths.live_root().display(), e);
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(SurfTransport::new()) as Arc<dyn Transport>);
        let orchestrator = Orchestrator::new(
            Arc::new(paths),
            transport,
            NotificationBus::new(),
            config.timeout(),
        );

        Ok(LiveBundle {
            bundles: self.bundles,
            config,
            orchestrator,
        })
    }
}

/// One application's live bundle. Create it once at startup and share it.
pub struct LiveBundle {
    bundles: BundleSet,
    config: LiveBundleConfig,
    orchestrator: Orchestrator,
}

impl LiveBundle {
    pub fn builder(main: DirBundle) -> LiveBundleBuilder {
        LiveBundleBuilder {
            bundles: BundleSet::new(main),
            config: None,
            transport: None,
        }
    }

    /// Settings from the bundle and environment, HTTP over surf.
    pub fn open(main: DirBundle) -> anyhow::Result<Self> {
        Self::builder(main).build()
    }

    pub fn config(&self) -> &LiveBundleConfig {
        &self.config
    }

    pub fn bundles(&self) -> &BundleSet {
        &self.bundles
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    fn paths(&self) -> &PathResolver {
        self.orchestrator.store().paths()
    }

    /// Local path for `name.ext`; kicks off the resource's update check the
    /// first time it is asked for. Call it as often as needed: the network is
    /// consulted at most once per resource.
    pub fn resolve(&self, name: &str, ext: &str) -> Result<PathBuf, LiveBundleError> {
        self.orchestrator.resolve(&ResourceId::new(name, ext))
    }

    pub fn resolve_tracked(&self, name: &str, ext: &str) -> Resolution {
        self.orchestrator.resolve_tracked(&ResourceId::new(name, ext))
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        self.orchestrator.bus().subscribe(handler)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.orchestrator.bus().unsubscribe(token)
    }

    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<UpdateEvent> {
        self.orchestrator.bus().subscribe_channel()
    }

    /// This application's directory in the live cache.
    pub fn live_bundle_path(&self) -> &Path {
        self.paths().live_root()
    }

    pub fn remote_url_for_resource(&self, name: &str, ext: &str) -> Result<Url, LiveBundleError> {
        self.paths().remote_locator(&ResourceId::new(name, ext))
    }

    pub fn live_path_for_resource(&self, name: &str, ext: &str) -> PathBuf {
        self.paths().live_path(&ResourceId::new(name, ext))
    }

    pub fn temp_path_for_resource(&self, name: &str, ext: &str) -> PathBuf {
        self.paths().temp_path(&ResourceId::new(name, ext))
    }

    pub fn candidate_paths(&self, name: &str, ext: &str) -> CandidatePaths {
        self.paths().candidates(&ResourceId::new(name, ext))
    }

    pub fn bundle_with_resource(&self, name: &str, ext: &str) -> Option<&DirBundle> {
        self.bundles.bundle_with_resource(name, ext)
    }

    pub fn framework_with_resource(&self, name: &str, ext: &str) -> Option<&DirBundle> {
        self.bundles.framework_with_resource(name, ext)
    }
}
