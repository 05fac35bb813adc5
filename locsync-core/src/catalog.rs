//! Per-entry YAML catalog of locations and asset versions.
//!
//! # Storage layout
//!
//! ```text
//! ~/.locsync/
//!   locations/
//!     <location_name>.yaml   (one file per location, mode 0600)
//!   versions/
//!     <version_id>.yaml      (one file per asset version, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{io_err, CoreError};
use crate::types::{AccessorConfig, AssetVersion, Location, LocationId, LocationName, VersionId};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.locsync/`
pub fn root_at(home: &Path) -> PathBuf {
    home.join(".locsync")
}

/// `<home>/.locsync/locations/`
pub fn locations_dir_at(home: &Path) -> PathBuf {
    root_at(home).join("locations")
}

/// `<home>/.locsync/versions/`
pub fn versions_dir_at(home: &Path) -> PathBuf {
    root_at(home).join("versions")
}

/// `<home>/.locsync/locations/<name>.yaml`, pure, no I/O.
pub fn location_path_at(home: &Path, name: &LocationName) -> PathBuf {
    locations_dir_at(home).join(format!("{}.yaml", name.0))
}

/// `<home>/.locsync/versions/<id>.yaml`, pure, no I/O.
pub fn version_path_at(home: &Path, id: &VersionId) -> PathBuf {
    versions_dir_at(home).join(format!("{}.yaml", id.0))
}

/// Reject names that would resolve outside their catalog directory.
///
/// Location names and version ids become file names, so separators, `.`
/// and `..` are refused.
pub fn check_entry_name(kind: &'static str, name: &str) -> Result<(), CoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CoreError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Default home directory (`dirs::home_dir()`).
pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// 2. Locations
// ---------------------------------------------------------------------------

/// Load a single location by name.
///
/// Returns `CoreError::NotFound` if absent, `CoreError::Parse` if malformed.
pub fn load_location_at(home: &Path, name: &LocationName) -> Result<Location, CoreError> {
    check_entry_name("location", name.as_str())?;
    load_yaml(&location_path_at(home, name), "location")
}

/// Every registered location, sorted by name.
pub fn list_locations_at(home: &Path) -> Result<Vec<Location>, CoreError> {
    let mut locations: Vec<Location> = list_yaml(&locations_dir_at(home))?;
    locations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(locations)
}

/// `list_locations_at` convenience wrapper.
pub fn list_locations() -> Result<Vec<Location>, CoreError> {
    list_locations_at(&home()?)
}

/// Find a location by id by scanning the catalog.
pub fn find_location_at(home: &Path, id: &LocationId) -> Result<Location, CoreError> {
    list_locations_at(home)?
        .into_iter()
        .find(|location| &location.id == id)
        .ok_or_else(|| CoreError::NotFound {
            kind: "location",
            path: locations_dir_at(home).join(format!("<id {id}>")),
        })
}

/// Atomically save a location to `<home>/.locsync/locations/<name>.yaml`.
pub fn save_location_at(home: &Path, location: &Location) -> Result<(), CoreError> {
    check_entry_name("location", location.name.as_str())?;
    save_yaml(&location_path_at(home, &location.name), location)
}

/// Register a new location under a freshly generated id.
///
/// Fails with `CoreError::AlreadyExists` if the name is taken; location names
/// are the role keys used by the sync engine and must stay unique.
pub fn add_location_at(
    home: &Path,
    name: LocationName,
    description: Option<String>,
    priority: i64,
    accessor: Option<AccessorConfig>,
) -> Result<Location, CoreError> {
    check_entry_name("location", name.as_str())?;
    if location_path_at(home, &name).exists() {
        return Err(CoreError::AlreadyExists {
            kind: "location",
            name: name.0,
        });
    }

    let location = Location {
        id: LocationId::from(Uuid::new_v4().to_string()),
        name,
        description,
        priority,
        accessor,
    };
    save_location_at(home, &location)?;
    tracing::info!("registered location {} ({})", location.name, location.id);
    Ok(location)
}

/// `add_location_at` convenience wrapper.
pub fn add_location(
    name: LocationName,
    description: Option<String>,
    priority: i64,
    accessor: Option<AccessorConfig>,
) -> Result<Location, CoreError> {
    add_location_at(&home()?, name, description, priority, accessor)
}

// ---------------------------------------------------------------------------
// 3. Asset versions
// ---------------------------------------------------------------------------

/// Load a single asset version by id.
pub fn load_version_at(home: &Path, id: &VersionId) -> Result<AssetVersion, CoreError> {
    check_entry_name("asset version", id.as_str())?;
    load_yaml(&version_path_at(home, id), "asset version")
}

/// Every registered asset version, sorted by id.
pub fn list_versions_at(home: &Path) -> Result<Vec<AssetVersion>, CoreError> {
    let mut versions: Vec<AssetVersion> = list_yaml(&versions_dir_at(home))?;
    versions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(versions)
}

/// Atomically save an asset version to `<home>/.locsync/versions/<id>.yaml`.
pub fn save_version_at(home: &Path, version: &AssetVersion) -> Result<(), CoreError> {
    check_entry_name("asset version", version.id.as_str())?;
    save_yaml(&version_path_at(home, &version.id), version)
}

/// `save_version_at` convenience wrapper.
pub fn save_version(version: &AssetVersion) -> Result<(), CoreError> {
    save_version_at(&home()?, version)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn load_yaml<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T, CoreError> {
    if !path.exists() {
        return Err(CoreError::NotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn list_yaml<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, CoreError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".yaml"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let item = serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
            path: path.clone(),
            source: e,
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem).
fn save_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid catalog path")));
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        set_dir_permissions(dir)?;
    }

    let yaml = serde_yaml::to_string(value)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
