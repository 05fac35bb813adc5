//! Entity-store and event-hub seams, bundled into a [`SyncContext`].

use std::sync::mpsc;
use std::sync::Arc;

use locsync_core::{
    config::Settings,
    types::{
        AssetVersion, Component, ComponentId, HubMessage, Job, JobId, JobStatus, LocationId,
        LocationName, UserId, VersionId,
    },
};

use crate::error::SyncError;
use crate::location::LocationHandle;

/// Entity store the orchestrators read from and write jobs into.
///
/// Every job call persists immediately; there is no separate commit step.
pub trait Session: Send + Sync {
    /// All registered locations.
    fn locations(&self) -> Result<Vec<LocationHandle>, SyncError>;

    fn location(&self, id: &LocationId) -> Result<LocationHandle, SyncError>;

    fn asset_version(&self, id: &VersionId) -> Result<AssetVersion, SyncError>;

    fn component(&self, id: &ComponentId) -> Result<Component, SyncError>;

    /// Create a job in status `running`.
    fn create_job(&self, description: &str, user: &UserId) -> Result<Job, SyncError>;

    fn update_job(&self, id: &JobId, update: JobUpdate) -> Result<Job, SyncError>;
}

/// Publish side of the event hub.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, message: HubMessage) -> Result<(), SyncError>;
}

/// Partial overwrite of a job record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub description: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobUpdate {
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            status: None,
        }
    }

    pub fn status(status: JobStatus) -> Self {
        Self {
            description: None,
            status: Some(status),
        }
    }

    /// Apply the update in place. Returns `true` if anything changed.
    pub fn apply(&self, job: &mut Job) -> bool {
        let mut changed = false;
        if let Some(description) = &self.description {
            if &job.description != description {
                job.description = description.clone();
                changed = true;
            }
        }
        if let Some(status) = self.status {
            if job.status != status {
                job.status = status;
                changed = true;
            }
        }
        changed
    }
}

/// [`EventPublisher`] over a std channel; used for in-process two-phase runs.
pub struct ChannelPublisher {
    sender: mpsc::Sender<HubMessage>,
}

impl ChannelPublisher {
    pub fn new(sender: mpsc::Sender<HubMessage>) -> Self {
        Self { sender }
    }

    /// A publisher and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::Receiver<HubMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, message: HubMessage) -> Result<(), SyncError> {
        self.sender
            .send(message)
            .map_err(|_| SyncError::Publish("event channel closed".to_string()))
    }
}

/// Everything an orchestrator call needs; no ambient lookups.
#[derive(Clone)]
pub struct SyncContext {
    pub session: Arc<dyn Session>,
    pub publisher: Arc<dyn EventPublisher>,
    /// Name of the staging location used between the two phases.
    pub staging_location: LocationName,
    /// Components whose name contains this marker are never synced.
    pub review_marker: String,
}

impl SyncContext {
    pub fn new(session: Arc<dyn Session>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_settings(session, publisher, &Settings::default())
    }

    pub fn with_settings(
        session: Arc<dyn Session>,
        publisher: Arc<dyn EventPublisher>,
        settings: &Settings,
    ) -> Self {
        Self {
            session,
            publisher,
            staging_location: settings.sync_location.clone(),
            review_marker: settings.review_marker.clone(),
        }
    }

    pub fn is_review_artifact(&self, component: &Component) -> bool {
        !self.review_marker.is_empty() && component.name.contains(&self.review_marker)
    }
}
