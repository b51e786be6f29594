use crate::paths::{is_single_component, TEMP_SUFFIX};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Name under which resource updates are announced.
pub const RESOURCE_UPDATED: &str = "LiveBundleResourceUpdate";

/// A logical resource: a name plus its type extension, e.g. `("logo", "png")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    name: String,
    ext: String,
}

impl ResourceId {
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    pub fn file_name(&self) -> String {
        file_name(&self.name, &self.ext)
    }

    /// Whether the file name stays inside the directory it is joined to and
    /// cannot be mistaken for an in-progress download.
    pub fn is_plain(&self) -> bool {
        let file_name = self.file_name();
        is_single_component(&file_name)
            && !file_name
                .rsplit_once('.')
                .is_some_and(|(_, suffix)| suffix == TEMP_SUFFIX)
    }
}

/// `name.ext`, or just `name` when the resource has no extension.
pub fn file_name(name: &str, ext: &str) -> String {
    if ext.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, ext)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Published once per successful promotion of a downloaded resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub resource: ResourceId,
    pub live_path: PathBuf,
}

impl UpdateEvent {
    pub fn new(resource: ResourceId, live_path: PathBuf) -> Self {
        Self {
            resource,
            live_path,
        }
    }

    pub fn name(&self) -> &'static str {
        RESOURCE_UPDATED
    }
}
