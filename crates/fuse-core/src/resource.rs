//! Template resources and how unit ids are turned into them.
//!
//! A [`TemplateResource`] always holds a canonical absolute path, which is what
//! the compiled-template cache keys on. Strings become resources only at the
//! boundary ([`TemplateResource::open_path`] or a [`ResourceLoader`]), never
//! inside the cache.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::{FuseError, Result};

/// Handle to a template file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateResource {
    path: PathBuf,
}

impl TemplateResource {
    /// Resolve `path` to its canonical form. Fails with
    /// [`FuseError::ResourceNotFound`] if it does not exist.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|e| FuseError::ResourceNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { path: canonical })
    }

    /// Canonical absolute path; also the cache key.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file as UTF-8 text. The file is closed before returning.
    pub fn read_all(&self) -> Result<String> {
        let mut file = File::open(&self.path).map_err(|e| FuseError::ResourceNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| FuseError::ResourceRead {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(contents)
    }
}

/// Locates the template belonging to a unit.
pub trait ResourceLoader: Send + Sync {
    /// Find the template for `unit` under `base`, with `extension` appended
    /// to the unit id (e.g. `".hbs"`).
    fn locate(&self, unit: &str, base: &str, extension: &str) -> Result<TemplateResource>;
}

/// Loads unit templates from `<root>/<base>/<unit><extension>`.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for FileSystemLoader {
    fn locate(&self, unit: &str, base: &str, extension: &str) -> Result<TemplateResource> {
        if unit.is_empty() || !stays_inside(unit) || !stays_inside(base) {
            return Err(FuseError::InvalidUnit(unit.to_string()));
        }
        let path = self.root.join(base).join(format!("{unit}{extension}"));
        TemplateResource::open_path(path)
    }
}

/// True if `relative` only has normal components (no root, no `..`).
fn stays_inside(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
