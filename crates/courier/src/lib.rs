//! # livebundle-courier
//!
//! **The live cache and the downloads that feed it.**
//!
//! A resource's live copy lives at `<cache_root>/<namespace>/<name>.<ext>`.
//! The [`Downloader`] fetches the remote copy into a sibling `.tmp` file,
//! compares it with the live copy and, when it differs, renames it into
//! place and publishes an `UpdateEvent`.
//!
//! ```no_run
//! use livebundle_core::{DirBundle, NotificationBus, PathResolver, ResourceId, Url};
//! use livebundle_courier::{CacheStore, Downloader, SurfTransport};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[async_std::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bundle = Arc::new(DirBundle::new("com.example.app", "Example.app/Contents/Resources"));
//!     let base = Url::parse("https://example.com/livebundle")?;
//!     let paths = PathResolver::new(bundle, "/tmp/LiveBundles".as_ref(), "com.example.app", Some(base))?;
//!
//!     let store = CacheStore::new(Arc::new(paths));
//!     let downloader = Downloader::new(
//!         store,
//!         Arc::new(SurfTransport::new()),
//!         NotificationBus::new(),
//!         Duration::from_secs(30),
//!     );
//!
//!     let outcome = downloader.check_and_update(&ResourceId::new("example", "plist")).await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

/// Committed local state: best path lookup, promotion and temp cleanup.
pub mod store;

/// The HTTP seam and its surf implementation.
pub mod transport;

/// The check-and-update cycle.
pub mod downloader;

pub use downloader::{Downloader, UpdateOutcome};
pub use store::CacheStore;
pub use transport::{FetchOutcome, SurfTransport, Transport};
