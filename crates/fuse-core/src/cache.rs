//! Compiled-template cache keyed by canonical file path.
//!
//! Entries are compiled on first reference and then kept for the lifetime of
//! the cache. Nothing is invalidated when a file changes on disk; callers that
//! want hot reload call [`TemplateCache::clear`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use handlebars::Template;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{FuseError, Result};
use crate::resource::TemplateResource;

/// Shared map of compiled templates, safe to use from concurrent renders.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<PathBuf, Arc<Template>>>,
    compilations: AtomicU64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled template for `resource`, compiling it on a miss.
    ///
    /// A hit does no I/O. On a miss the file is read, trimmed and compiled
    /// outside the lock; if another thread inserted the same key meanwhile,
    /// its entry is kept and returned.
    pub fn get_or_compile(&self, resource: &TemplateResource) -> Result<Arc<Template>> {
        if let Some(template) = self.entries.read().get(resource.path()) {
            return Ok(Arc::clone(template));
        }

        debug!(path = %resource.path().display(), "reading template");
        let source = resource.read_all()?;
        let compiled = Arc::new(compile(resource.path(), source.trim())?);
        self.compilations.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        let entry = entries
            .entry(resource.path().to_path_buf())
            .or_insert(compiled);
        Ok(Arc::clone(entry))
    }

    /// Whether a compiled template is cached for this canonical path.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of compilations performed since creation.
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Drop every entry; the next lookup of each path recompiles it.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!(entries = entries.len(), "clearing template cache");
        entries.clear();
    }
}

fn compile(path: &Path, source: &str) -> Result<Template> {
    let mut template = Template::compile(source).map_err(|e| FuseError::TemplateCompile {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    template.name = Some(path.display().to_string());
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_resource(dir: &Path, name: &str, contents: &str) -> TemplateResource {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        TemplateResource::open_path(path).unwrap()
    }

    #[test]
    fn test_second_lookup_returns_same_template() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "a.hbs", "<b>{{name}}</b>");
        let cache = TemplateCache::new();

        let first = cache.get_or_compile(&resource).unwrap();
        let second = cache.get_or_compile(&resource).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compilations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_does_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "a.hbs", "cached");
        let cache = TemplateCache::new();
        let first = cache.get_or_compile(&resource).unwrap();

        std::fs::remove_file(resource.path()).unwrap();
        let second = cache.get_or_compile(&resource).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_file_not_recompiled() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "a.tmpl", "original");
        let cache = TemplateCache::new();
        let first = cache.get_or_compile(&resource).unwrap();

        std::fs::write(resource.path(), "changed {{x}}").unwrap();
        let second = cache.get_or_compile(&resource).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compilations(), 1);
    }

    #[test]
    fn test_clear_forces_recompile() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "a.hbs", "v1");
        let cache = TemplateCache::new();
        let first = cache.get_or_compile(&resource).unwrap();

        std::fs::write(resource.path(), "v2").unwrap();
        cache.clear();
        assert!(cache.is_empty());
        let second = cache.get_or_compile(&resource).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compilations(), 2);
    }

    #[test]
    fn test_equivalent_paths_share_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.hbs"), "a").unwrap();
        let cache = TemplateCache::new();

        let direct = TemplateResource::open_path(dir.path().join("a.hbs")).unwrap();
        let dotted = TemplateResource::open_path(dir.path().join("sub/../a.hbs")).unwrap();
        let first = cache.get_or_compile(&direct).unwrap();
        let second = cache.get_or_compile(&dotted).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(direct.path()));
    }

    #[test]
    fn test_syntax_error_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "bad.hbs", "{{#if x}}unclosed");
        let cache = TemplateCache::new();

        let result = cache.get_or_compile(&resource);
        assert!(matches!(result, Err(FuseError::TemplateCompile { .. })));
        assert!(cache.is_empty());
        assert_eq!(cache.compilations(), 0);
    }

    #[test]
    fn test_concurrent_first_populate_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(dir.path(), "a.hbs", "{{x}}");
        let cache = Arc::new(TemplateCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let resource = resource.clone();
                std::thread::spawn(move || cache.get_or_compile(&resource).unwrap())
            })
            .collect();
        let templates: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 1);
        let kept = cache.get_or_compile(&resource).unwrap();
        assert!(templates.iter().any(|t| Arc::ptr_eq(t, &kept)));
    }
}
