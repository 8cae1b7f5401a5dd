//! Zone registry: which units fill which zone, in order.
//!
//! The registry is built by whatever composes the page (a JSON file for the
//! CLI, direct [`ZoneRegistry::register`] calls elsewhere) and is only read
//! while rendering.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FuseError, Result};

/// Mapping from zone name to the ordered unit ids registered for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneRegistry {
    zones: BTreeMap<String, Vec<String>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `unit` to `zone`. Duplicates are kept; order is registration order.
    pub fn register(&mut self, zone: impl Into<String>, unit: impl Into<String>) -> &mut Self {
        self.zones.entry(zone.into()).or_default().push(unit.into());
        self
    }

    /// Units registered for `zone`, or an empty slice.
    pub fn units(&self, zone: &str) -> &[String] {
        self.zones.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All zones in name order.
    pub fn zones(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.zones.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Load a registry from a JSON object of `zone -> [unit, ...]`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FuseError::ConfigNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| FuseError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl<Z, U> FromIterator<(Z, U)> for ZoneRegistry
where
    Z: Into<String>,
    U: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (Z, U)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (zone, unit) in iter {
            registry.register(zone, unit);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_and_duplicates_kept() {
        let mut zones = ZoneRegistry::new();
        zones
            .register("sidebar", "widgetB")
            .register("sidebar", "widgetA")
            .register("sidebar", "widgetB");
        assert_eq!(zones.units("sidebar"), ["widgetB", "widgetA", "widgetB"]);
    }

    #[test]
    fn test_unknown_zone_is_empty() {
        let zones = ZoneRegistry::new();
        assert!(zones.units("header").is_empty());
        assert!(zones.is_empty());
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        std::fs::write(&path, r#"{ "sidebar": ["widgetA", "widgetB"], "footer": [] }"#).unwrap();

        let zones = ZoneRegistry::load(&path).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.units("sidebar"), ["widgetA", "widgetB"]);
        let names: Vec<&str> = zones.zones().map(|(name, _)| name).collect();
        assert_eq!(names, ["footer", "sidebar"]);
    }

    #[test]
    fn test_load_rejects_non_list_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        std::fs::write(&path, r#"{ "sidebar": "widgetA" }"#).unwrap();
        assert!(matches!(
            ZoneRegistry::load(&path),
            Err(FuseError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_from_iter() {
        let zones: ZoneRegistry = [("header", "logo"), ("header", "nav")].into_iter().collect();
        assert_eq!(zones.units("header"), ["logo", "nav"]);
    }
}
