use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use fuse_core::{FuseConfig, ZoneCompositor};

use crate::output;

/// Compile every registered unit template and the given layouts.
///
/// All templates are attempted; the command fails if any of them does not
/// locate or compile.
pub fn run(config_path: &Path, zones: Option<&Path>, layouts: &[PathBuf]) -> Result<()> {
    let config = FuseConfig::load_or_default(config_path)?;
    let zones = super::load_zones(&config, zones)?;
    let compositor = ZoneCompositor::from_config(config);

    output::print_header("fuse check");

    let failures = check_templates(&compositor, &unit_ids(&zones), layouts);
    if failures == 0 {
        output::print_success(&format!(
            "{} template(s) compiled",
            compositor.cache().len()
        ));
        Ok(())
    } else {
        anyhow::bail!("{failures} template(s) failed to compile")
    }
}

/// Distinct unit ids across all zones, sorted.
fn unit_ids(zones: &fuse_core::ZoneRegistry) -> Vec<String> {
    let ids: BTreeSet<&String> = zones.zones().flat_map(|(_, units)| units).collect();
    ids.into_iter().cloned().collect()
}

/// Returns the number of templates that failed.
fn check_templates(compositor: &ZoneCompositor, units: &[String], layouts: &[PathBuf]) -> usize {
    let total = units.len() + layouts.len();
    let mut failures = 0;
    let mut step = 0;

    for unit in units {
        step += 1;
        output::print_step(step, total, unit);
        let result = compositor
            .locate_unit(unit)
            .and_then(|resource| compositor.compiled_template(&resource));
        if let Err(e) = result {
            output::print_error(&format!("{unit}: {}", error_chain(&e)));
            failures += 1;
        }
    }

    for layout in layouts {
        step += 1;
        output::print_step(step, total, &layout.display().to_string());
        if let Err(e) = compositor.compiled_template_at(layout) {
            output::print_error(&format!("{}: {}", layout.display(), error_chain(&e)));
            failures += 1;
        }
    }

    failures
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
