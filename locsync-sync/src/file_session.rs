//! [`Session`] backed by the on-disk catalog and job store.

use std::path::{Path, PathBuf};

use locsync_core::{
    catalog,
    types::{AssetVersion, Component, ComponentId, Job, JobId, LocationId, UserId, VersionId},
};

use crate::disk::handle_for;
use crate::error::SyncError;
use crate::job_store;
use crate::location::LocationHandle;
use crate::session::{JobUpdate, Session};

/// Reads locations and versions from `<home>/.locsync/` and persists jobs
/// there as JSON.
#[derive(Debug, Clone)]
pub struct FileSession {
    home: PathBuf,
}

impl FileSession {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Session rooted at the user's home directory.
    pub fn open() -> Result<Self, SyncError> {
        Ok(Self::new(catalog::home()?))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

impl Session for FileSession {
    fn locations(&self) -> Result<Vec<LocationHandle>, SyncError> {
        Ok(catalog::list_locations_at(&self.home)?
            .into_iter()
            .map(handle_for)
            .collect())
    }

    fn location(&self, id: &LocationId) -> Result<LocationHandle, SyncError> {
        Ok(handle_for(catalog::find_location_at(&self.home, id)?))
    }

    fn asset_version(&self, id: &VersionId) -> Result<AssetVersion, SyncError> {
        Ok(catalog::load_version_at(&self.home, id)?)
    }

    fn component(&self, id: &ComponentId) -> Result<Component, SyncError> {
        catalog::list_versions_at(&self.home)?
            .into_iter()
            .flat_map(|version| version.components)
            .find(|component| &component.id == id)
            .ok_or_else(|| SyncError::NotFound {
                kind: "component",
                id: id.0.clone(),
            })
    }

    fn create_job(&self, description: &str, user: &UserId) -> Result<Job, SyncError> {
        job_store::create_at(&self.home, description, user)
    }

    fn update_job(&self, id: &JobId, update: JobUpdate) -> Result<Job, SyncError> {
        job_store::update_at(&self.home, id, update)
    }
}
