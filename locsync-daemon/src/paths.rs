use std::path::{Path, PathBuf};

use locsync_core::catalog::root_at;

pub const DAEMON_SOCKET: &str = "daemon.sock";

/// Jobs shown in the status payload.
pub const RECENT_JOBS: usize = 10;

pub fn run_dir(home: &Path) -> PathBuf {
    root_at(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    root_at(home).join(DAEMON_SOCKET)
}
