//! # Error Module
//!
//! Error types for the picture sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Branchable** - callers can tell "already exists" apart from a real I/O failure

use crate::core::operations::BatchSummary;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reason a single file operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationErrorKind {
    NotFound,
    AlreadyExists,
    IoFailure,
    DecodeFailure,
    NoBackup,
    InvalidState,
    InvalidAngle,
    BatchFailed,
}

/// Errors returned by `FileOperation::apply` and `FileOperation::revert`
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("A file already exists at {path}")]
    AlreadyExists { path: PathBuf },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No backup was captured for {path}, nothing to restore")]
    NoBackup { path: PathBuf },

    #[error("'{description}' has not been applied")]
    NotApplied { description: String },

    #[error("'{description}' is already applied")]
    AlreadyApplied { description: String },

    #[error("Rotation must be a multiple of 90 degrees, got {degrees}")]
    InvalidAngle { degrees: i32 },

    #[error(
        "No file in the batch succeeded ({} skipped, {} failed)",
        .summary.skipped,
        .summary.errored
    )]
    BatchFailed { summary: BatchSummary },

    #[error("{failed} file(s) in the batch could not be undone; {reverted} were re-applied")]
    BatchRevert { reverted: usize, failed: usize },
}

impl OperationError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => OperationError::NotFound { path },
            io::ErrorKind::AlreadyExists => OperationError::AlreadyExists { path },
            _ => OperationError::Io { path, source },
        }
    }

    /// The taxonomy bucket this error falls into
    pub fn kind(&self) -> OperationErrorKind {
        match self {
            OperationError::NotFound { .. } => OperationErrorKind::NotFound,
            OperationError::AlreadyExists { .. } => OperationErrorKind::AlreadyExists,
            OperationError::Io { .. } | OperationError::BatchRevert { .. } => {
                OperationErrorKind::IoFailure
            }
            OperationError::Decode { .. } => OperationErrorKind::DecodeFailure,
            OperationError::NoBackup { .. } => OperationErrorKind::NoBackup,
            OperationError::NotApplied { .. } | OperationError::AlreadyApplied { .. } => {
                OperationErrorKind::InvalidState
            }
            OperationError::InvalidAngle { .. } => OperationErrorKind::InvalidAngle,
            OperationError::BatchFailed { .. } => OperationErrorKind::BatchFailed,
        }
    }

    /// Whether this is the "destination already taken" skip condition
    pub fn is_already_exists(&self) -> bool {
        self.kind() == OperationErrorKind::AlreadyExists
    }
}

/// Errors returned by the command history
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Failed to execute '{description}': {source}")]
    Execute {
        description: String,
        #[source]
        source: OperationError,
    },

    #[error("Failed to undo '{description}': {source}")]
    Undo {
        description: String,
        #[source]
        source: OperationError,
    },

    #[error("Failed to redo '{description}': {source}")]
    Redo {
        description: String,
        #[source]
        source: OperationError,
    },

    #[error("History lock was poisoned by a panicking caller")]
    Poisoned,
}

impl HistoryError {
    /// The underlying operation failure, if any
    pub fn operation_error(&self) -> Option<&OperationError> {
        match self {
            HistoryError::Execute { source, .. }
            | HistoryError::Undo { source, .. }
            | HistoryError::Redo { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors that occur while enumerating or loading images
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SorterError>;

/// Result type for single file operations
pub type OperationResult<T> = std::result::Result<T, OperationError>;
