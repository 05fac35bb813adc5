//! Error types for locsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from catalog and settings operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, includes the file path.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, cannot locate `~/.locsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A catalog entry did not exist at the expected path.
    #[error("{kind} not found at {path}")]
    NotFound { kind: &'static str, path: PathBuf },

    /// A catalog entry with the same key already exists.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// A name or id that cannot be used as a catalog file name.
    #[error("invalid {kind} name '{name}': must be a single path component")]
    InvalidName { kind: &'static str, name: String },
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
