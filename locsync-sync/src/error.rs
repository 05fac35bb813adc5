//! Error types for locsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use locsync_core::{types::LocationName, CoreError};

use crate::roles::Role;

/// Failure of one availability query or one component copy.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination already holds identical content.
    #[error("component {component} is already present in {location}")]
    AlreadyPresent { component: String, location: String },

    /// The location has no accessor and cannot take part in a transfer.
    #[error("location {location} is not accessible")]
    Unreachable { location: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other storage backend failure.
    #[error("{0}")]
    Backend(String),
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the catalog or settings layer.
    #[error("catalog error: {0}")]
    Core(#[from] CoreError),

    /// A role name did not match any registered location.
    #[error("no location named '{name}' for role {role}")]
    UnresolvedRole { role: Role, name: LocationName },

    /// An entity looked up by id does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A transfer error that escaped per-component handling.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// An I/O error, with annotated path for context (job store).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (job store).
    #[error("job store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The event hub refused a message.
    #[error("failed to publish event: {0}")]
    Publish(String),

    /// The launch form values were rejected.
    #[error("invalid launch request: {0}")]
    InvalidLaunch(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`TransferError::Io`].
pub(crate) fn transfer_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.into(),
        source,
    }
}
