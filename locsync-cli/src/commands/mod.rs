pub mod daemon;
pub mod jobs;
pub mod location;
pub mod sync;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
