use std::path::Path;

use anyhow::Result;

use fuse_core::FuseConfig;

use crate::output;

/// List every zone and its units in registration order.
pub fn run(config_path: &Path, zones: Option<&Path>) -> Result<()> {
    let config = FuseConfig::load_or_default(config_path)?;
    let zones = super::load_zones(&config, zones)?;

    output::print_header("fuse zones");
    if zones.is_empty() {
        output::print_warning("No zones registered");
        return Ok(());
    }
    for (zone, units) in zones.zones() {
        let listed = if units.is_empty() {
            "(empty)".to_string()
        } else {
            units.join(", ")
        };
        output::print_key_value(zone, &listed);
    }
    println!();
    Ok(())
}
