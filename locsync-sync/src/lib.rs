//! # locsync-sync
//!
//! Two-phase component synchronization between registered locations.
//!
//! Call [`push_to_staging`] on the machine that hosts the source location to
//! copy a selection into the staging location, and [`pull_to_destination`]
//! on the machine that hosts the destination when the resulting
//! [`SyncEvent`](locsync_core::SyncEvent) arrives. [`pipeline::dispatch`]
//! routes hub messages to the right phase.

pub mod action;
pub mod disk;
pub mod error;
pub mod file_session;
pub mod job;
pub mod job_store;
pub mod location;
pub mod memory;
pub mod outcome;
pub mod pipeline;
pub mod pull;
pub mod push;
pub mod roles;
pub mod routing;
pub mod session;
mod transfer;

pub use error::{SyncError, TransferError};
pub use job::JobReporter;
pub use location::{Accessor, LocationHandle};
pub use outcome::{ComponentOutcome, ComponentReport, PushReport, RunReport, SkipReason};
pub use pull::{pull_to_destination, PullRequest};
pub use push::{push_to_staging, PushRequest};
pub use session::{EventPublisher, JobUpdate, Session, SyncContext};
