//! locsync core library: domain types, catalog persistence, settings, errors.
//!
//! - [`types`]: newtype ids, locations, components, jobs and event shapes
//! - [`error`]: [`CoreError`]
//! - [`catalog`]: location and asset-version catalog (load / save / add)
//! - [`config`]: `config.yaml` settings with environment overrides

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use config::Settings;
pub use error::CoreError;
pub use types::{
    AccessorConfig, AssetVersion, Component, ComponentId, ComponentRef, HubMessage, Job, JobId,
    JobStatus, LaunchEvent, Location, LocationId, LocationName, SelectionEntry, SyncEvent,
    UserId, VersionId,
};
