//! In-memory stand-ins for the platform: session, accessor and publisher.
//!
//! They record every availability query, every store call and every job
//! write so callers can assert exactly what an orchestrator run did.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use locsync_core::types::{
    AssetVersion, Component, ComponentId, HubMessage, Job, JobId, JobStatus, Location,
    LocationId, LocationName, UserId, VersionId,
};

use crate::error::{io_err, SyncError, TransferError};
use crate::location::{content_digest, Accessor, LocationHandle};
use crate::session::{EventPublisher, JobUpdate, Session};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Accessor
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AccessorState {
    blobs: HashMap<ComponentId, Vec<u8>>,
    availability: HashMap<ComponentId, f64>,
    failures: HashMap<ComponentId, String>,
    availability_calls: Vec<ComponentId>,
    store_calls: Vec<ComponentId>,
}

/// Blob store keyed by component id.
///
/// Availability is 100 for stored blobs and 0 otherwise, unless pinned with
/// [`MemoryAccessor::set_availability`]; a successful store clears the pin.
#[derive(Default)]
pub struct MemoryAccessor {
    state: Mutex<AccessorState>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(self, id: &ComponentId, data: &[u8]) -> Self {
        lock(&self.state).blobs.insert(id.clone(), data.to_vec());
        self
    }

    pub fn set_availability(&self, id: &ComponentId, percent: f64) {
        lock(&self.state).availability.insert(id.clone(), percent);
    }

    /// Make every store of `id` fail with `message`.
    pub fn fail_store(&self, id: &ComponentId, message: impl Into<String>) {
        lock(&self.state).failures.insert(id.clone(), message.into());
    }

    pub fn content(&self, id: &ComponentId) -> Option<Vec<u8>> {
        lock(&self.state).blobs.get(id).cloned()
    }

    /// Component ids passed to `availability`, in call order.
    pub fn availability_calls(&self) -> Vec<ComponentId> {
        lock(&self.state).availability_calls.clone()
    }

    /// Component ids passed to `store`, in call order (including failures).
    pub fn store_calls(&self) -> Vec<ComponentId> {
        lock(&self.state).store_calls.clone()
    }
}

impl Accessor for MemoryAccessor {
    fn availability(&self, component: &Component) -> Result<f64, TransferError> {
        let mut state = lock(&self.state);
        state.availability_calls.push(component.id.clone());
        if let Some(percent) = state.availability.get(&component.id) {
            return Ok(*percent);
        }
        Ok(if state.blobs.contains_key(&component.id) {
            100.0
        } else {
            0.0
        })
    }

    fn fetch(&self, component: &Component) -> Result<Vec<u8>, TransferError> {
        lock(&self.state)
            .blobs
            .get(&component.id)
            .cloned()
            .ok_or_else(|| TransferError::Backend(format!("no data for component {}", component.id)))
    }

    fn digest(&self, component: &Component) -> Result<Option<String>, TransferError> {
        Ok(lock(&self.state)
            .blobs
            .get(&component.id)
            .map(|data| content_digest(data)))
    }

    fn store(&self, component: &Component, data: &[u8]) -> Result<(), TransferError> {
        let mut state = lock(&self.state);
        state.store_calls.push(component.id.clone());
        if let Some(message) = state.failures.get(&component.id) {
            return Err(TransferError::Backend(message.clone()));
        }
        state.availability.remove(&component.id);
        state.blobs.insert(component.id.clone(), data.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SessionState {
    locations: Vec<LocationHandle>,
    versions: HashMap<VersionId, AssetVersion>,
    jobs: BTreeMap<JobId, Job>,
    job_writes: Vec<Job>,
    next_job: u64,
    description_failure: Option<String>,
}

/// Entity store held entirely in memory.
#[derive(Default)]
pub struct MemorySession {
    state: Mutex<SessionState>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location with id `loc-<name>`.
    pub fn add_location(
        &self,
        name: &str,
        accessor: Option<Arc<MemoryAccessor>>,
    ) -> LocationHandle {
        let handle = LocationHandle::new(
            Location {
                id: LocationId::from(format!("loc-{name}")),
                name: LocationName::from(name),
                description: None,
                priority: 0,
                accessor: None,
            },
            accessor.map(|a| a as Arc<dyn Accessor>),
        );
        lock(&self.state).locations.push(handle.clone());
        handle
    }

    pub fn add_version(&self, version: AssetVersion) {
        lock(&self.state).versions.insert(version.id.clone(), version);
    }

    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.state).jobs.values().cloned().collect()
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        lock(&self.state).jobs.get(id).cloned()
    }

    /// Make every description-only job update fail with `message`.
    /// Status writes still go through.
    pub fn fail_description_writes(&self, message: impl Into<String>) {
        lock(&self.state).description_failure = Some(message.into());
    }

    /// Snapshot of the job after every persisted write, oldest first.
    pub fn job_writes(&self, id: &JobId) -> Vec<Job> {
        lock(&self.state)
            .job_writes
            .iter()
            .filter(|job| &job.id == id)
            .cloned()
            .collect()
    }
}

impl Session for MemorySession {
    fn locations(&self) -> Result<Vec<LocationHandle>, SyncError> {
        Ok(lock(&self.state).locations.clone())
    }

    fn location(&self, id: &LocationId) -> Result<LocationHandle, SyncError> {
        lock(&self.state)
            .locations
            .iter()
            .find(|handle| handle.id() == id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                kind: "location",
                id: id.0.clone(),
            })
    }

    fn asset_version(&self, id: &VersionId) -> Result<AssetVersion, SyncError> {
        lock(&self.state)
            .versions
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                kind: "asset version",
                id: id.0.clone(),
            })
    }

    fn component(&self, id: &ComponentId) -> Result<Component, SyncError> {
        lock(&self.state)
            .versions
            .values()
            .flat_map(|version| version.components.iter())
            .find(|component| &component.id == id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                kind: "component",
                id: id.0.clone(),
            })
    }

    fn create_job(&self, description: &str, user: &UserId) -> Result<Job, SyncError> {
        let mut state = lock(&self.state);
        state.next_job += 1;
        let now = Utc::now();
        let job = Job {
            id: JobId::from(format!("job-{}", state.next_job)),
            description: description.to_string(),
            status: JobStatus::Running,
            user: user.clone(),
            created_at: now,
            updated_at: now,
        };
        state.jobs.insert(job.id.clone(), job.clone());
        state.job_writes.push(job.clone());
        Ok(job)
    }

    fn update_job(&self, id: &JobId, update: JobUpdate) -> Result<Job, SyncError> {
        let mut state = lock(&self.state);
        if update.status.is_none() {
            if let Some(message) = &state.description_failure {
                return Err(io_err(
                    format!("<memory>/jobs/{id}"),
                    std::io::Error::new(std::io::ErrorKind::Other, message.clone()),
                ));
            }
        }
        let job = state.jobs.get_mut(id).ok_or_else(|| SyncError::NotFound {
            kind: "job",
            id: id.0.clone(),
        })?;
        update.apply(job);
        job.updated_at = Utc::now();
        let snapshot = job.clone();
        state.job_writes.push(snapshot.clone());
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Publisher that keeps every message.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<HubMessage>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<HubMessage> {
        lock(&self.messages).clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, message: HubMessage) -> Result<(), SyncError> {
        lock(&self.messages).push(message);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_sync_event() -> locsync_core::SyncEvent {
    use locsync_core::types::{EventSource, SyncEventData, SyncLocations, SYNC_TOPIC};

    locsync_core::SyncEvent {
        topic: SYNC_TOPIC.to_string(),
        data: SyncEventData {
            action_identifier: "ftrack-to-studio.disk".to_string(),
            components: vec![],
            locations: SyncLocations {
                sync: LocationId::from("loc-ftrack.sync"),
                source: LocationId::from("loc-alice.local"),
                destination: LocationId::from("loc-studio.disk"),
            },
        },
        source: EventSource {
            user: UserId::from("alice"),
        },
    }
}
