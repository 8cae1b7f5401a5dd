//! Handlebars helpers bridging templates to the compositor.
//!
//! | helper | effect |
//! |--------|--------|
//! | `{{defineZone "name"}}`, `{{#defineZone "name"}}fallback{{/defineZone}}` | [`ZoneCompositor::resolve_zone`] |
//! | `{{#zone "name"}}content{{/zone}}` | [`ZoneCompositor::is_zone_active`] |
//! | `{{layout "name"}}` | [`ZoneCompositor::describe_layout`] |
//!
//! Helpers are registered into a registry built for one page render and
//! borrow that render's [`PageScope`].

use handlebars::{
    html_escape, Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderError, RenderErrorReason, Renderable, StringOutput, Template,
};
use parking_lot::Mutex;

use crate::compositor::ZoneCompositor;
use crate::context::RequestContext;
use crate::error::{FuseError, Result};
use crate::registry::ZoneRegistry;

pub const DEFINE_ZONE: &str = "defineZone";
pub const ZONE: &str = "zone";
pub const LAYOUT: &str = "layout";

/// Everything the helpers of one page render need.
///
/// Handlebars only carries [`RenderError`] through a render, so the first
/// [`FuseError`] raised by a helper is parked here and handed back to the
/// caller once rendering unwinds.
pub(crate) struct PageScope<'a> {
    compositor: &'a ZoneCompositor,
    request: &'a RequestContext,
    zones: &'a ZoneRegistry,
    failure: Mutex<Option<FuseError>>,
}

impl<'a> PageScope<'a> {
    pub(crate) fn new(
        compositor: &'a ZoneCompositor,
        request: &'a RequestContext,
        zones: &'a ZoneRegistry,
    ) -> Self {
        Self {
            compositor,
            request,
            zones,
            failure: Mutex::new(None),
        }
    }

    /// Record `err` (unless an earlier failure is already recorded) and
    /// convert it for Handlebars.
    fn fail(&self, err: FuseError) -> RenderError {
        let message = err.to_string();
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(err);
        }
        RenderErrorReason::Other(message).into()
    }

    pub(crate) fn take_failure(&self) -> Option<FuseError> {
        self.failure.lock().take()
    }
}

/// Register the zone helpers on `hbs`, bound to `scope`.
pub(crate) fn register<'a>(hbs: &mut Handlebars<'a>, scope: &'a PageScope<'a>) {
    hbs.register_helper(DEFINE_ZONE, Box::new(DefineZoneHelper { scope }));
    hbs.register_helper(ZONE, Box::new(ZoneHelper { scope }));
    hbs.register_helper(LAYOUT, Box::new(LayoutHelper { scope }));
}

struct DefineZoneHelper<'a> {
    scope: &'a PageScope<'a>,
}

impl HelperDef for DefineZoneHelper<'_> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let zone_name = name_param(h, DEFINE_ZONE)?;
        let fallback = h.template().map(|t| move || render_block(t, r, ctx, rc));
        let zone = self
            .scope
            .compositor
            .resolve_zone(r, self.scope.request, self.scope.zones, zone_name, fallback)
            .map_err(|e| self.scope.fail(e))?;
        out.write(zone.as_str())?;
        Ok(())
    }
}

struct ZoneHelper<'a> {
    scope: &'a PageScope<'a>,
}

impl HelperDef for ZoneHelper<'_> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let candidate = name_param(h, ZONE)?;
        let previewing = self.scope.request.current_zone().is_none();
        let content = self
            .scope
            .compositor
            .is_zone_active(self.scope.request, candidate, || match h.template() {
                Some(t) => render_block(t, r, ctx, rc),
                None => Ok(String::new()),
            })
            .map_err(|e| self.scope.fail(e))?;

        if previewing {
            out.write(&html_escape(&content))?;
        } else {
            out.write(&content)?;
        }
        Ok(())
    }
}

struct LayoutHelper<'a> {
    scope: &'a PageScope<'a>,
}

impl HelperDef for LayoutHelper<'_> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let layout_name = name_param(h, LAYOUT)?;
        let marker = self
            .scope
            .compositor
            .describe_layout(self.scope.request, layout_name);
        out.write(&html_escape(&marker))?;
        Ok(())
    }
}

/// First positional parameter, which must be a string.
fn name_param<'a>(
    h: &'a Helper<'_>,
    helper: &'static str,
) -> std::result::Result<&'a str, RenderError> {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(helper, 0))?;
    param
        .value()
        .as_str()
        .ok_or_else(|| RenderErrorReason::InvalidParamType("string").into())
}

/// Render a helper's block against the caller's context.
fn render_block<'reg: 'rc, 'rc>(
    template: &'rc Template,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
) -> Result<String> {
    let mut buf = StringOutput::new();
    template.render(r, ctx, rc, &mut buf)?;
    buf.into_string().map_err(|e| FuseError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuseConfig;
    use serde_json::json;

    fn render(source: &str, request: &RequestContext) -> std::result::Result<String, RenderError> {
        let compositor = ZoneCompositor::from_config(FuseConfig::default());
        let zones = ZoneRegistry::new();
        let scope = PageScope::new(&compositor, request, &zones);
        let mut hbs = Handlebars::new();
        register(&mut hbs, &scope);
        hbs.render_template(source, &json!({ "name": "header" }))
    }

    #[test]
    fn test_zone_helper_requires_name() {
        assert!(render("{{#zone}}x{{/zone}}", &RequestContext::new()).is_err());
    }

    #[test]
    fn test_layout_helper_rejects_non_string() {
        assert!(render("{{layout 42}}", &RequestContext::new()).is_err());
    }

    #[test]
    fn test_zone_helper_accepts_context_value() {
        let request = RequestContext::new();
        let _guard = request.enter_zone("header").unwrap();
        let out = render("{{#zone name}}  hit  {{/zone}}", &request).unwrap();
        assert_eq!(out, "hit");
    }

    #[test]
    fn test_placeholder_escaped() {
        let out = render("{{layout \"<main>\"}}", &RequestContext::new()).unwrap();
        assert_eq!(out, "layout_&lt;main&gt;");
    }

    #[test]
    fn test_first_failure_kept() {
        let compositor = ZoneCompositor::from_config(FuseConfig::default());
        let request = RequestContext::new();
        let zones = ZoneRegistry::new();
        let scope = PageScope::new(&compositor, &request, &zones);

        scope.fail(FuseError::EmptyZoneName);
        scope.fail(FuseError::InvalidUnit("x".into()));
        assert!(matches!(scope.take_failure(), Some(FuseError::EmptyZoneName)));
        assert!(scope.take_failure().is_none());
    }
}
