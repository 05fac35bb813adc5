//! Disk accessor: components stored as files below a prefix directory.
//!
//! Layout is `<prefix>/<component_id>/<file name>`. Writes go through
//! `<path>.locsync.tmp` and a rename, so a component file is either absent
//! or complete.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use locsync_core::types::{AccessorConfig, Component, Location};

use crate::error::{transfer_io_err, TransferError};
use crate::location::{content_digest, Accessor, LocationHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskAccessor {
    prefix: PathBuf,
}

impl DiskAccessor {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Where `component` lives below the prefix.
    pub fn component_path(&self, component: &Component) -> PathBuf {
        self.prefix
            .join(sanitise(component.id.as_str()))
            .join(sanitise(&component.name))
    }

    /// Copy an existing file in as `component`.
    pub fn import_file(&self, component: &Component, file: &Path) -> Result<(), TransferError> {
        let data = std::fs::read(file).map_err(|e| transfer_io_err(file, e))?;
        self.store(component, &data)
    }
}

/// Keep file names to a single path segment.
fn sanitise(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

impl Accessor for DiskAccessor {
    fn availability(&self, component: &Component) -> Result<f64, TransferError> {
        Ok(if self.component_path(component).is_file() {
            100.0
        } else {
            0.0
        })
    }

    fn fetch(&self, component: &Component) -> Result<Vec<u8>, TransferError> {
        let path = self.component_path(component);
        std::fs::read(&path).map_err(|e| transfer_io_err(path, e))
    }

    fn digest(&self, component: &Component) -> Result<Option<String>, TransferError> {
        let path = self.component_path(component);
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(content_digest(&data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(transfer_io_err(path, e)),
        }
    }

    fn store(&self, component: &Component, data: &[u8]) -> Result<(), TransferError> {
        let path = self.component_path(component);
        let tmp = PathBuf::from(format!("{}.locsync.tmp", path.display()));
        write_atomic(&path, &tmp, data)
    }
}

fn write_atomic(path: &Path, tmp: &Path, data: &[u8]) -> Result<(), TransferError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| transfer_io_err(parent, e))?;
    }
    std::fs::write(tmp, data).map_err(|e| transfer_io_err(tmp, e))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(transfer_io_err(path, e));
    }
    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

/// Build the handle for a catalog location from its accessor config.
pub fn handle_for(location: Location) -> LocationHandle {
    let accessor: Option<Arc<dyn Accessor>> = match &location.accessor {
        Some(AccessorConfig::Disk { prefix }) => Some(Arc::new(DiskAccessor::new(prefix.clone()))),
        None => None,
    };
    LocationHandle::new(location, accessor)
}
