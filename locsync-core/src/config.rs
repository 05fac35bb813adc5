//! `~/.locsync/config.yaml` settings.
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! Environment variables are applied on top of whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{home, root_at};
use crate::error::{io_err, CoreError};
use crate::types::LocationName;

/// Appends one hosted location name.
pub const ENV_HOST_LOCATION: &str = "LOCSYNC_HOST_LOCATION";
/// Replaces the staging location name.
pub const ENV_SYNC_LOCATION: &str = "LOCSYNC_SYNC_LOCATION";

/// Well-known staging location used between the two sync phases.
pub const DEFAULT_SYNC_LOCATION: &str = "ftrack.sync";
/// Component names containing this marker are review proxies and never synced.
pub const DEFAULT_REVIEW_MARKER: &str = "ftrackreview";
/// Platform-owned locations hidden from the launch menu.
pub const DEFAULT_RESERVED_LOCATIONS: [&str; 5] = [
    "ftrack.origin",
    "ftrack.server",
    "ftrack.unmanaged",
    "ftrack.connect",
    "ftrack.review",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync_location: LocationName,
    pub reserved_locations: Vec<String>,
    pub review_marker: String,
    /// Locations served by this machine; the daemon only reacts to events
    /// routed to one of these names.
    pub host_locations: Vec<LocationName>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_location: LocationName::from(DEFAULT_SYNC_LOCATION),
            reserved_locations: DEFAULT_RESERVED_LOCATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            review_marker: DEFAULT_REVIEW_MARKER.to_string(),
            host_locations: vec![],
        }
    }
}

impl Settings {
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_locations.iter().any(|r| r == name)
    }

    /// Apply `LOCSYNC_*` overrides from the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_SYNC_LOCATION).filter(|v| !v.trim().is_empty()) {
            self.sync_location = LocationName::from(name.trim());
        }
        if let Some(name) = lookup(ENV_HOST_LOCATION).filter(|v| !v.trim().is_empty()) {
            let name = LocationName::from(name.trim());
            if !self.host_locations.contains(&name) {
                self.host_locations.push(name);
            }
        }
    }
}

/// `<home>/.locsync/config.yaml`
pub fn settings_path_at(home: &Path) -> PathBuf {
    root_at(home).join("config.yaml")
}

/// Load settings without environment overrides. A missing file yields defaults.
pub fn load_file_at(home: &Path) -> Result<Settings, CoreError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// Load settings and apply process environment overrides.
pub fn load_at(home: &Path) -> Result<Settings, CoreError> {
    let mut settings = load_file_at(home)?;
    settings.apply_overrides(|key| std::env::var(key).ok());
    Ok(settings)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, CoreError> {
    load_at(&home()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let home = TempDir::new().unwrap();
        let settings = load_file_at(home.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sync_location.as_str(), "ftrack.sync");
        assert!(settings.is_reserved("ftrack.review"));
        assert!(!settings.is_reserved("studio.disk"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let home = TempDir::new().unwrap();
        let path = settings_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "host_locations: [studio.disk]\n").unwrap();

        let settings = load_file_at(home.path()).unwrap();
        assert_eq!(settings.host_locations, vec![LocationName::from("studio.disk")]);
        assert_eq!(settings.review_marker, DEFAULT_REVIEW_MARKER);
    }

    #[test]
    fn malformed_file_reports_path() {
        let home = TempDir::new().unwrap();
        let path = settings_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "host_locations: {broken: [").unwrap();
        let err = load_file_at(home.path()).unwrap_err();
        assert!(err.to_string().contains("config.yaml"), "got: {err}");
    }

    #[test]
    fn overrides_replace_staging_and_append_host() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SYNC_LOCATION, "studio.staging"),
            (ENV_HOST_LOCATION, "alice.local"),
        ]);
        let mut settings = Settings::default();
        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.sync_location.as_str(), "studio.staging");
        assert_eq!(settings.host_locations, vec![LocationName::from("alice.local")]);
    }
}
