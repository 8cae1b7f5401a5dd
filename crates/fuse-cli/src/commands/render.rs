use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use fuse_core::{FuseConfig, RequestContext, TemplateResource, ZoneCompositor};

use crate::output;

/// Render `layout` with its zones expanded.
///
/// The page goes to `output` when given, otherwise to stdout.
pub fn run(
    config_path: &Path,
    layout: &Path,
    zones: Option<&Path>,
    data: Option<&Path>,
    output: Option<&Path>,
    request_id: Option<&str>,
) -> Result<()> {
    let html = render_page(config_path, layout, zones, data, request_id)?;

    match output {
        Some(path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            output::print_success(&format!(
                "Rendered {} -> {}",
                layout.display(),
                path.display()
            ));
        }
        None => println!("{html}"),
    }
    Ok(())
}

fn render_page(
    config_path: &Path,
    layout: &Path,
    zones: Option<&Path>,
    data: Option<&Path>,
    request_id: Option<&str>,
) -> Result<String> {
    let config = FuseConfig::load_or_default(config_path)?;
    let zones = super::load_zones(&config, zones)?;
    let data = load_data(data)?;
    let request = match request_id {
        Some(id) => RequestContext::with_id(id),
        None => RequestContext::new(),
    };
    tracing::info!(request = %request.id(), layout = %layout.display(), "rendering page");

    let compositor = ZoneCompositor::from_config(config);
    let layout = TemplateResource::open_path(layout)?;
    Ok(compositor.render_page(&request, &zones, &layout, &data)?)
}

fn load_data(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Object(Default::default()));
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid JSON in data file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_project() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("units")).unwrap();
        std::fs::write(root.join("units/nav.hbs"), "<nav>{{self.publicURL}}</nav>").unwrap();
        std::fs::write(root.join("zones.json"), r#"{ "header": ["nav"] }"#).unwrap();
        std::fs::write(root.join("data.json"), r#"{ "title": "Home" }"#).unwrap();
        std::fs::write(
            root.join("main.hbs"),
            "<title>{{title}}</title>{{defineZone \"header\"}}{{#defineZone \"footer\"}} (c) {{/defineZone}}",
        )
        .unwrap();

        let html = render_page(
            &root.join("fuse.config.json"),
            &root.join("main.hbs"),
            None,
            Some(&root.join("data.json")),
            Some("req-42"),
        )
        .unwrap();
        assert_eq!(html, "<title>Home</title><nav>/fuse/public/nav</nav>(c)");
    }

    #[test]
    fn test_missing_layout_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_page(
            &dir.path().join("fuse.config.json"),
            &dir.path().join("missing.hbs"),
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(load_data(Some(&path)).is_err());
    }
}
