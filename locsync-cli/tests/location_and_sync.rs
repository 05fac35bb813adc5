use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn locsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("locsync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("LOCSYNC_HOST_LOCATION")
        .env_remove("LOCSYNC_SYNC_LOCATION");
    cmd
}

fn add_location(home: &Path, name: &str, prefix: Option<&Path>) {
    let mut cmd = locsync_cmd(home);
    cmd.args(["location", "add", name]);
    if let Some(prefix) = prefix {
        cmd.arg("--prefix").arg(prefix);
    }
    cmd.assert().success();
}

/// alice.local, ftrack.sync and studio.disk on disk, plus the reserved
/// ftrack.server without storage.
fn studio_setup(home: &Path, storage: &Path) {
    add_location(home, "alice.local", Some(storage.join("alice").as_path()));
    add_location(home, "ftrack.sync", Some(storage.join("staging").as_path()));
    add_location(home, "studio.disk", Some(storage.join("studio").as_path()));
    add_location(home, "ftrack.server", None);
}

fn add_version(home: &Path, storage: &Path) {
    let render = storage.join("render.mov");
    let review = storage.join("review.mp4");
    fs::write(&render, b"frames").expect("write render");
    fs::write(&review, b"proxy").expect("write review");
    locsync_cmd(home)
        .args(["version", "add", "v1", "--location", "alice.local", "--component"])
        .arg(format!("render.mov={}", render.display()))
        .arg("--component")
        .arg(format!("ftrackreview-mp4={}", review.display()))
        .assert()
        .success()
        .stdout(contains("v1-1"));
}

#[test]
fn location_add_and_list() {
    let home = TempDir::new().expect("home");
    let storage = TempDir::new().expect("storage");
    studio_setup(home.path(), storage.path());

    locsync_cmd(home.path())
        .args(["location", "list"])
        .assert()
        .success()
        .stdout(contains("alice.local"))
        .stdout(contains("staging"))
        .stdout(contains("reserved"));

    locsync_cmd(home.path())
        .args(["location", "add", "alice.local"])
        .assert()
        .failure()
        .stderr(contains("alice.local"));
}

#[test]
fn menu_hides_reserved_locations() {
    let home = TempDir::new().expect("home");
    let storage = TempDir::new().expect("storage");
    studio_setup(home.path(), storage.path());

    let assert = locsync_cmd(home.path())
        .args(["location", "menu", "--current", "alice.local"])
        .assert()
        .success()
        .stdout(contains("Sync @ alice.local"));
    let form: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("form json");
    let items = form["items"].as_array().expect("items");
    assert_eq!(items.len(), 4);
    assert_eq!(items[2]["name"], "source_location");
    assert_eq!(items[2]["value"], "alice.local");
    let labels: Vec<&str> = items[3]["data"]
        .as_array()
        .expect("options")
        .iter()
        .filter_map(|option| option["label"].as_str())
        .collect();
    assert_eq!(labels, vec!["alice.local", "ftrack.sync", "studio.disk"]);
}

#[test]
fn menu_without_hosted_location_needs_current() {
    let home = TempDir::new().expect("home");
    locsync_cmd(home.path())
        .args(["location", "menu"])
        .assert()
        .failure()
        .stderr(contains("--current"));
}

#[test]
fn local_sync_delivers_files_and_records_jobs() {
    let home = TempDir::new().expect("home");
    let storage = TempDir::new().expect("storage");
    studio_setup(home.path(), storage.path());
    add_version(home.path(), storage.path());

    locsync_cmd(home.path())
        .args([
            "sync",
            "--from",
            "alice.local",
            "--to",
            "studio.disk",
            "--user",
            "alice",
            "v1",
        ])
        .assert()
        .success()
        .stdout(contains("push -> 'ftrack.sync'"))
        .stdout(contains("pull -> 'studio.disk'"))
        .stdout(contains("render.mov copied"))
        .stdout(contains("ftrackreview-mp4 skipped (review proxy)"));

    let delivered = storage.path().join("studio").join("v1-1").join("render.mov");
    assert_eq!(fs::read(&delivered).expect("delivered"), b"frames");
    assert!(!storage
        .path()
        .join("studio")
        .join("v1-2")
        .join("ftrackreview-mp4")
        .exists());

    let assert = locsync_cmd(home.path())
        .args(["jobs", "--json"])
        .assert()
        .success();
    let jobs: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("jobs json");
    let jobs = jobs.as_array().expect("array");
    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert_eq!(job["status"], "done");
        assert_eq!(job["user"], "alice");
    }
}

#[test]
fn second_sync_copies_nothing() {
    let home = TempDir::new().expect("home");
    let storage = TempDir::new().expect("storage");
    studio_setup(home.path(), storage.path());
    add_version(home.path(), storage.path());

    let args = ["sync", "--from", "alice.local", "--to", "studio.disk", "v1"];
    locsync_cmd(home.path()).args(args).assert().success();
    locsync_cmd(home.path())
        .args(args)
        .assert()
        .success()
        .stdout(contains("render.mov skipped (already synced)"))
        .stdout(contains("copied").not());
}

#[test]
fn sync_to_unknown_location_is_rejected() {
    let home = TempDir::new().expect("home");
    let storage = TempDir::new().expect("storage");
    studio_setup(home.path(), storage.path());

    locsync_cmd(home.path())
        .args(["sync", "--from", "alice.local", "--to", "nowhere", "v1"])
        .assert()
        .failure()
        .stderr(contains("Destination location nowhere does not exist"));

    locsync_cmd(home.path())
        .args(["jobs"])
        .assert()
        .success()
        .stdout(contains("No jobs recorded."));
}

#[test]
fn daemon_status_when_not_running() {
    let home = TempDir::new().expect("home");
    let assert = locsync_cmd(home.path())
        .args(["daemon", "status"])
        .assert()
        .success();
    let status: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("status json");
    assert_eq!(status["running"], false);

    locsync_cmd(home.path())
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(contains("daemon is not running"));
}
