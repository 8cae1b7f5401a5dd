//! Compositor configuration (`fuse.config.json`).
//!
//! All fields are optional in the file; anything left out takes the default
//! shown below. Relative paths are resolved against the directory holding the
//! config file, so a project can be rendered from any working directory.
//!
//! ```json
//! {
//!   "public_prefix": "/fuse/public/",
//!   "template_extension": ".hbs",
//!   "units_dir": "units",
//!   "zones_file": "zones.json",
//!   "strict_mode": false
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FuseError, Result};

/// Default name of the config file looked up by the CLI.
pub const CONFIG_FILE: &str = "fuse.config.json";

/// Settings shared by every render performed through a [`crate::ZoneCompositor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseConfig {
    /// Prefix joined with a unit id to form the unit's `self.publicURL`.
    pub public_prefix: String,
    /// Extension appended to a unit id to locate its template (leading dot included).
    pub template_extension: String,
    /// Directory holding unit templates.
    pub units_dir: PathBuf,
    /// JSON file mapping zone names to ordered unit ids.
    pub zones_file: PathBuf,
    /// Fail on references to variables missing from the render data.
    pub strict_mode: bool,
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            public_prefix: "/fuse/public/".into(),
            template_extension: ".hbs".into(),
            units_dir: PathBuf::from("units"),
            zones_file: PathBuf::from("zones.json"),
            strict_mode: false,
        }
    }
}

impl FuseConfig {
    /// Load a config file, resolving its relative paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FuseError::ConfigNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: FuseConfig =
            serde_json::from_str(&contents).map_err(|e| FuseError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rooted_at(base))
    }

    /// Load `path` if it exists; otherwise use defaults rooted at the path's directory.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::default().rooted_at(base))
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| FuseError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Make `units_dir` and `zones_file` relative to `base` unless already absolute.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.units_dir.is_relative() {
            self.units_dir = base.join(&self.units_dir);
        }
        if self.zones_file.is_relative() {
            self.zones_file = base.join(&self.zones_file);
        }
        self
    }
}
