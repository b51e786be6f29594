use crate::resource::ResourceId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveBundleError {
    /// The bundle has no packaged copy of the resource.
    #[error("no packaged resource named {0}")]
    NotFound(ResourceId),

    /// Neither a packaged nor a live cached copy exists.
    #[error("resource {0} has neither a bundled nor a cached copy")]
    ResourceUnavailable(ResourceId),

    /// The name would leave the resource directory or collide with a temp file.
    #[error("{0:?} is not a valid resource file name")]
    InvalidResource(ResourceId),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("download timed out after {0:?}")]
    Timeout(Duration),

    #[error("promoting {} to {} failed: {source}", .temp.display(), .live.display())]
    PromotionFailed {
        temp: PathBuf,
        live: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LiveBundleError>;
