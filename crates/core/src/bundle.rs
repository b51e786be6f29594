use crate::resource::ResourceId;
use std::path::{Path, PathBuf};

/// Host packaging lookup: where a resource shipped with the application lives.
pub trait BundleLookup: Send + Sync {
    /// Identifier of the owning application, e.g. `com.example.app`.
    fn identifier(&self) -> &str;

    /// Path of the packaged `name.ext`, if the bundle ships one.
    fn lookup_packaged(&self, name: &str, ext: &str) -> Option<PathBuf>;
}

/// A bundle whose packaged resources sit flat in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirBundle {
    identifier: String,
    resources_root: PathBuf,
}

impl DirBundle {
    pub fn new(identifier: impl Into<String>, resources_root: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            resources_root: resources_root.into(),
        }
    }

    pub fn resources_root(&self) -> &Path {
        &self.resources_root
    }
}

impl BundleLookup for DirBundle {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn lookup_packaged(&self, name: &str, ext: &str) -> Option<PathBuf> {
        let id = ResourceId::new(name, ext);
        if !id.is_plain() {
            return None;
        }
        let path = self.resources_root.join(id.file_name());
        path.is_file().then_some(path)
    }
}

/// The application bundle plus the framework bundles embedded in it.
#[derive(Debug, Clone)]
pub struct BundleSet {
    main: DirBundle,
    frameworks: Vec<DirBundle>,
}

impl BundleSet {
    pub fn new(main: DirBundle) -> Self {
        Self {
            main,
            frameworks: Vec::new(),
        }
    }

    pub fn with_framework(mut self, framework: DirBundle) -> Self {
        self.frameworks.push(framework);
        self
    }

    pub fn main(&self) -> &DirBundle {
        &self.main
    }

    pub fn frameworks(&self) -> &[DirBundle] {
        &self.frameworks
    }

    /// First bundle shipping `name.ext`, searching the main bundle before frameworks.
    pub fn bundle_with_resource(&self, name: &str, ext: &str) -> Option<&DirBundle> {
        std::iter::once(&self.main)
            .chain(self.frameworks.iter())
            .find(|b| b.lookup_packaged(name, ext).is_some())
    }

    /// First framework bundle shipping `name.ext`.
    pub fn framework_with_resource(&self, name: &str, ext: &str) -> Option<&DirBundle> {
        self.frameworks
            .iter()
            .find(|b| b.lookup_packaged(name, ext).is_some())
    }
}

impl BundleLookup for BundleSet {
    fn identifier(&self) -> &str {
        self.main.identifier()
    }

    fn lookup_packaged(&self, name: &str, ext: &str) -> Option<PathBuf> {
        self.bundle_with_resource(name, ext)
            .and_then(|b| b.lookup_packaged(name, ext))
    }
}
