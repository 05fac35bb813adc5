//! Catalog error-message, on-disk layout and parse-failure tests.

use assert_fs::prelude::*;
use locsync_core::{
    catalog,
    types::{AccessorConfig, AssetVersion, Component, LocationName, VersionId},
    CoreError,
};
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;

fn name(s: &str) -> LocationName {
    LocationName::from(s)
}

// ---------------------------------------------------------------------------
// 1. Layout
// ---------------------------------------------------------------------------

#[test]
fn add_location_writes_one_yaml_per_location() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    catalog::add_location_at(
        home.path(),
        name("alice.local"),
        None,
        -1,
        Some(AccessorConfig::Disk {
            prefix: PathBuf::from("/home/alice/projects"),
        }),
    )
    .expect("add");

    home.child(".locsync/locations/alice.local.yaml")
        .assert(predicate::path::exists());
    home.child(".locsync/locations/alice.local.yaml")
        .assert(predicate::str::contains("kind: disk"));
    home.child(".locsync/locations/alice.local.yaml.tmp")
        .assert(predicate::path::missing());
}

#[cfg(unix)]
#[test]
fn catalog_files_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    catalog::add_location_at(home.path(), name("ftrack.sync"), None, 1000, None).expect("add");

    let path = catalog::location_path_at(home.path(), &name("ftrack.sync"));
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn version_components_keep_their_order() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let version = AssetVersion {
        id: VersionId::from("v-042"),
        label: Some("shot010 comp v042".to_string()),
        components: vec![
            Component::new("c3", "render.mov"),
            Component::new("c1", "ftrackreview-mp4"),
            Component::new("c2", "thumbnail"),
        ],
    };
    catalog::save_version_at(home.path(), &version).expect("save");

    let loaded = catalog::load_version_at(home.path(), &version.id).expect("load");
    let ids: Vec<_> = loaded.components.iter().map(|c| c.id.0.as_str()).collect();
    assert_eq!(ids, vec!["c3", "c1", "c2"]);
}

// ---------------------------------------------------------------------------
// 2. Error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_location_mentions_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = catalog::load_location_at(home.path(), &name("nowhere")).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("nowhere.yaml"));
}

#[rstest]
#[case::corrupt(": : corrupt : yaml : !!!\n  - broken: [unclosed")]
#[case::wrong_type("- this is a list, not a mapping\n")]
#[case::missing_fields("description: only a description\n")]
fn malformed_location_returns_parse_error(#[case] contents: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = catalog::locations_dir_at(home.path());
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("broken.yaml"), contents).expect("write");

    let err = catalog::load_location_at(home.path(), &name("broken")).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("broken.yaml"));

    let err = catalog::list_locations_at(home.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

#[test]
fn list_ignores_non_yaml_files() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    catalog::add_location_at(home.path(), name("studio.disk"), None, 0, None).expect("add");
    home.child(".locsync/locations/notes.txt")
        .write_str("not a location")
        .unwrap();

    let all = catalog::list_locations_at(home.path()).expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, name("studio.disk"));
}

// ---------------------------------------------------------------------------
// 3. Entry names
// ---------------------------------------------------------------------------

#[rstest]
#[case::parent("../escaped")]
#[case::nested("team/alice")]
#[case::backslash("team\\alice")]
#[case::dot(".")]
#[case::dotdot("..")]
#[case::empty("")]
fn add_location_rejects_path_like_names(#[case] raw: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = catalog::add_location_at(home.path(), name(raw), None, 0, None).unwrap_err();
    assert!(matches!(err, CoreError::InvalidName { kind: "location", .. }), "got: {err}");

    home.child(".locsync/escaped.yaml")
        .assert(predicate::path::missing());
    assert!(catalog::list_locations_at(home.path()).expect("list").is_empty());
}

#[test]
fn save_version_rejects_ids_leaving_versions_dir() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let version = AssetVersion {
        id: VersionId::from("../locations/x"),
        label: None,
        components: vec![Component::new("c1", "render.mov")],
    };

    let err = catalog::save_version_at(home.path(), &version).unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidName { kind: "asset version", .. }),
        "got: {err}"
    );
    home.child(".locsync/locations/x.yaml")
        .assert(predicate::path::missing());
}

#[test]
fn load_version_rejects_ids_leaving_versions_dir() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    catalog::add_location_at(home.path(), name("x"), None, 0, None).expect("add");

    let err = catalog::load_version_at(home.path(), &VersionId::from("../locations/x")).unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidName { kind: "asset version", .. }),
        "got: {err}"
    );
    assert!(err.to_string().contains("../locations/x"));
}

#[test]
fn dotted_names_stay_valid() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    catalog::add_location_at(home.path(), name("ftrack.sync"), None, 0, None).expect("add");
    catalog::check_entry_name("asset version", "v1.2").expect("dotted id");
}
