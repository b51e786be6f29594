//! # livebundle-core
//!
//! Shared vocabulary for the livebundle crates: resource identifiers, the
//! update event and its bus, configuration, the error type and the pure
//! path arithmetic that maps a resource to its bundled, live, temp and
//! remote locations.

pub mod bundle;
pub mod bus;
pub mod config;
pub mod error;
pub mod paths;
pub mod resource;

pub use bundle::{BundleLookup, BundleSet, DirBundle};
pub use bus::{NotificationBus, SubscriptionToken};
pub use config::LiveBundleConfig;
pub use error::{LiveBundleError, Result};
pub use paths::{CandidatePaths, PathResolver};
pub use resource::{ResourceId, UpdateEvent, RESOURCE_UPDATED};

pub use url::Url;
