//! CLI command implementations for fuse.
//!
//! Each module corresponds to a subcommand (`fuse <command>`).

pub mod check;
pub mod render;
pub mod zones;

use std::path::Path;

use anyhow::Result;
use fuse_core::{FuseConfig, ZoneRegistry};

/// Load the zone registry from `explicit` if given, else from the config's
/// `zones_file`. A missing default file yields an empty registry.
pub fn load_zones(config: &FuseConfig, explicit: Option<&Path>) -> Result<ZoneRegistry> {
    if let Some(path) = explicit {
        return Ok(ZoneRegistry::load(path)?);
    }
    if config.zones_file.exists() {
        return Ok(ZoneRegistry::load(&config.zones_file)?);
    }
    tracing::info!(
        path = %config.zones_file.display(),
        "no zone registry found, every zone is empty"
    );
    Ok(ZoneRegistry::new())
}
