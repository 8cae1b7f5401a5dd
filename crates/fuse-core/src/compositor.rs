//! Zone compositor: expands zones in a layout into their registered units.
//!
//! A layout declares insertion points with `{{defineZone "name"}}`. While a
//! zone resolves, every unit registered for it is rendered with its own small
//! scope (`self.publicURL`) and the outputs are concatenated in registration
//! order. Inside a unit template, `{{#zone "name"}}...{{/zone}}` emits its
//! content only while that zone is the one resolving, and `{{layout "name"}}`
//! only produces output when no zone is resolving (design-time preview).
//!
//! ## Usage
//!
//! ```ignore
//! use fuse_core::{FuseConfig, RequestContext, TemplateResource, ZoneCompositor, ZoneRegistry};
//!
//! let compositor = ZoneCompositor::from_config(FuseConfig::default());
//! let mut zones = ZoneRegistry::new();
//! zones.register("sidebar", "widgetA").register("sidebar", "widgetB");
//!
//! let layout = TemplateResource::open_path("layouts/main.hbs")?;
//! let html = compositor.render_page(&RequestContext::new(), &zones, &layout, &serde_json::json!({}))?;
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use handlebars::{
    html_escape, Context, Handlebars, RenderContext, RenderError, RenderErrorReason, Renderable,
    StringOutput, Template,
};
use serde_json::{json, Value};
use tracing::{debug, debug_span};

use crate::cache::TemplateCache;
use crate::config::FuseConfig;
use crate::context::RequestContext;
use crate::error::{FuseError, Result};
use crate::helpers::{self, PageScope};
use crate::registry::ZoneRegistry;
use crate::resource::{FileSystemLoader, ResourceLoader, TemplateResource};

/// Rendered markup that must be written without further escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Long-lived service owning the loader and the compiled-template cache.
///
/// Shareable across threads; all per-render state lives in the
/// [`RequestContext`] passed to each call.
pub struct ZoneCompositor {
    config: FuseConfig,
    loader: Box<dyn ResourceLoader>,
    cache: TemplateCache,
}

impl ZoneCompositor {
    pub fn new(config: FuseConfig, loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            config,
            loader,
            cache: TemplateCache::new(),
        }
    }

    /// Compositor loading unit templates from `config.units_dir`.
    pub fn from_config(config: FuseConfig) -> Self {
        let loader = FileSystemLoader::new(config.units_dir.clone());
        Self::new(config, Box::new(loader))
    }

    pub fn config(&self) -> &FuseConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Scope a unit's template is rendered with.
    pub fn unit_scope(&self, unit: &str) -> Value {
        json!({
            "self": {
                "publicURL": format!("{}{}", self.config.public_prefix, unit)
            }
        })
    }

    /// Locate the template belonging to `unit`.
    pub fn locate_unit(&self, unit: &str) -> Result<TemplateResource> {
        self.loader
            .locate(unit, "", &self.config.template_extension)
    }

    /// Compiled form of `resource`, from the cache when present.
    pub fn compiled_template(&self, resource: &TemplateResource) -> Result<Arc<Template>> {
        self.cache.get_or_compile(resource)
    }

    /// Resolve `path` to a resource, then return its compiled form.
    pub fn compiled_template_at(&self, path: impl AsRef<Path>) -> Result<Arc<Template>> {
        let resource = TemplateResource::open_path(path)?;
        self.compiled_template(&resource)
    }

    /// Expand `zone_name` into the concatenated output of its units.
    ///
    /// When no unit is registered and a `fallback` is given, its trimmed
    /// output is returned instead. The request's current-zone marker names
    /// this zone for the duration of the call and is cleared on every exit.
    pub fn resolve_zone<'reg, F>(
        &self,
        registry: &'reg Handlebars<'reg>,
        request: &RequestContext,
        zones: &ZoneRegistry,
        zone_name: &str,
        fallback: Option<F>,
    ) -> Result<SafeString>
    where
        F: FnOnce() -> Result<String>,
    {
        if zone_name.is_empty() {
            return Err(FuseError::EmptyZoneName);
        }
        let zone = html_escape(zone_name);
        let _guard = request.enter_zone(&zone)?;
        let units = zones.units(&zone);

        if units.is_empty() {
            if let Some(render_fallback) = fallback {
                return Ok(SafeString::new(render_fallback()?.trim()));
            }
        }

        let mut result = String::new();
        for unit in units {
            let resource = self.locate_unit(unit)?;
            debug!(
                request = %request.id(),
                zone = %zone,
                template = %resource.path().display(),
                "including unit template"
            );
            let template = self.compiled_template(&resource)?;
            result.push_str(&render_compiled(registry, &template, &self.unit_scope(unit))?);
        }
        Ok(SafeString::new(result))
    }

    /// Content of a `{{#zone}}` block declared inside a unit template.
    ///
    /// Outside zone resolution this is the placeholder `zone_<name>`.
    pub fn is_zone_active<F>(
        &self,
        request: &RequestContext,
        candidate: &str,
        block: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        match request.current_zone() {
            None => Ok(format!("zone_{candidate}")),
            Some(current) if current == candidate => Ok(block()?.trim().to_string()),
            Some(_) => Ok(String::new()),
        }
    }

    /// Placeholder `layout_<name>` outside zone resolution, empty inside it.
    pub fn describe_layout(&self, request: &RequestContext, layout_name: &str) -> String {
        match request.current_zone() {
            None => format!("layout_{layout_name}"),
            Some(_) => String::new(),
        }
    }

    /// Compile the layout at `layout` (through the cache) and render it.
    pub fn render_page(
        &self,
        request: &RequestContext,
        zones: &ZoneRegistry,
        layout: &TemplateResource,
        data: &Value,
    ) -> Result<String> {
        let template = self.compiled_template(layout)?;
        self.render_layout(request, zones, &template, data)
    }

    /// Render a compiled layout with the zone helpers bound to `request` and `zones`.
    ///
    /// If a helper failed, that failure is returned rather than the render
    /// error Handlebars wrapped it in.
    pub fn render_layout(
        &self,
        request: &RequestContext,
        zones: &ZoneRegistry,
        layout: &Template,
        data: &Value,
    ) -> Result<String> {
        let span = debug_span!("page", request = %request.id());
        let _enter = span.enter();

        let scope = PageScope::new(self, request, zones);
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(self.config.strict_mode);
        helpers::register(&mut hbs, &scope);

        render_compiled(&hbs, layout, data)
            .map_err(|e| scope.take_failure().unwrap_or_else(|| e.into()))
    }
}

/// Render an already compiled template against `data` in a fresh render context.
pub(crate) fn render_compiled<'reg>(
    registry: &'reg Handlebars<'reg>,
    template: &Template,
    data: &Value,
) -> std::result::Result<String, RenderError> {
    let ctx = Context::wraps(data)?;
    let mut rc = RenderContext::new(None);
    let mut out = StringOutput::new();
    template.render(registry, &ctx, &mut rc, &mut out)?;
    out.into_string()
        .map_err(|e| RenderErrorReason::Other(e.to_string()).into())
}
