//! Domain types for locsync.
//!
//! Identifiers are string newtypes so a location id can never be passed where
//! a component id is expected. Event structs serialize to the exact JSON shape
//! exchanged on the platform event hub (`actionIdentifier`, `entityId`, ...).

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic of the hand-off event published at the end of the push phase.
pub const SYNC_TOPIC: &str = "ftrack.sync";

/// Topic of the event raised when a user launches the sync action.
pub const LAUNCH_TOPIC: &str = "ftrack.action.launch";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Opaque identifier of a registered location.
    LocationId
);
string_newtype!(
    /// Unique, human-readable name of a location (e.g. `ftrack.sync`).
    LocationName
);
string_newtype!(
    /// Identifier of a single component (file) of an asset version.
    ComponentId
);
string_newtype!(
    /// Identifier of an asset version.
    VersionId
);
string_newtype!(
    /// Identifier of the user who requested a sync.
    UserId
);
string_newtype!(
    /// Identifier of a job record.
    JobId
);

// ---------------------------------------------------------------------------
// Locations and components
// ---------------------------------------------------------------------------

/// How a location reaches its storage. Absence on a [`Location`] means the
/// location cannot be used as either side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessorConfig {
    /// Files stored below `prefix` on a local or mounted disk.
    Disk { prefix: PathBuf },
}

/// A named storage endpoint for components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: LocationName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only used when picking a default location; never by the sync engine.
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<AccessorConfig>,
}

/// One file belonging to an asset version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
}

impl Component {
    pub fn new(id: impl Into<ComponentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Reference form used in the push → pull hand-off event.
    pub fn to_ref(&self) -> ComponentRef {
        ComponentRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// `{id, name}` entry of a [`SyncEvent`] component list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub id: ComponentId,
    #[serde(default)]
    pub name: String,
}

/// A published version of an asset; owns its components in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetVersion {
    pub id: VersionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Status of a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Running,
    Failed,
    Done,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Done => write!(f, "done"),
        }
    }
}

/// Live status record of one orchestration run. `description` is
/// overwritten in place on every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub status: JobStatus,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One selected entity of the launch action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    #[serde(rename = "entityId")]
    pub entity_id: VersionId,
}

impl SelectionEntry {
    pub fn new(entity_id: impl Into<VersionId>) -> Self {
        Self {
            entity_id: entity_id.into(),
        }
    }
}

/// `source` block of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    pub user: UserId,
}

/// Location ids carried by a [`SyncEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLocations {
    pub sync: LocationId,
    pub source: LocationId,
    pub destination: LocationId,
}

/// `data` block of a [`SyncEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEventData {
    #[serde(rename = "actionIdentifier")]
    pub action_identifier: String,
    pub components: Vec<ComponentRef>,
    pub locations: SyncLocations,
}

/// Hand-off from the push phase to the pull phase on the destination side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub topic: String,
    pub data: SyncEventData,
    pub source: EventSource,
}

/// Values picked in the two-field launch form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchValues {
    pub source_location: LocationName,
    pub dest_location: LocationName,
}

/// `data` block of a [`LaunchEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchEventData {
    #[serde(rename = "actionIdentifier")]
    pub action_identifier: String,
    pub values: LaunchValues,
    #[serde(default)]
    pub selection: Vec<SelectionEntry>,
}

/// Request to run the push phase on the machine hosting the source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub topic: String,
    pub data: LaunchEventData,
    pub source: EventSource,
}

/// Anything travelling through the event hub between the two phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HubMessage {
    Launch(LaunchEvent),
    Sync(SyncEvent),
}

impl HubMessage {
    /// The routing discriminant listeners subscribe on.
    pub fn action_identifier(&self) -> &str {
        match self {
            HubMessage::Launch(event) => &event.data.action_identifier,
            HubMessage::Sync(event) => &event.data.action_identifier,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            HubMessage::Launch(event) => &event.topic,
            HubMessage::Sync(event) => &event.topic,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
