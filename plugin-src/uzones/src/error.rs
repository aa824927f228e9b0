//! Error kinds for zone store, flag registry and persistence operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone '{0}' already exists")]
    DuplicateZone(String),

    #[error("zone '{0}' not found")]
    ZoneNotFound(String),

    #[error("node {index} is out of range for zone '{zone}' ({len} nodes)")]
    IndexOutOfRange {
        zone: String,
        index: usize,
        len: usize,
    },

    #[error("'{0}' is neither a predefined flag nor a flag pack")]
    UnknownFlag(String),

    #[error("flag '{flag}' is not set on zone '{zone}'")]
    FlagNotSet { zone: String, flag: String },

    /// The in-memory mutation has already been applied; only the write failed.
    #[error("failed to persist {path}: {cause}")]
    PersistenceFailed { path: PathBuf, cause: String },

    #[error("malformed document {path}: {cause}")]
    MalformedDocument { path: PathBuf, cause: String },
}

impl ZoneError {
    pub(crate) fn persistence(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        Self::PersistenceFailed {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn malformed(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        Self::MalformedDocument {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }
}
