//! # Operations Module
//!
//! Undoable single-file actions and their batch composite.
//!
//! ## Variants
//! - `CopyOperation` - copy a file into a target folder, never overwriting
//! - `MoveOperation` - move a file into a target folder
//! - `DeleteOperation` - delete a file, keeping its bytes in memory for undo
//! - `RotateOperation` - rotate an image in place via a temp file swap
//! - `BatchOperation` - best-effort group of any of the above
//!
//! ## Lifecycle
//! Every operation starts `Unexecuted`. A successful `apply()` makes it
//! `Applied`; a successful `revert()` returns it to `Unexecuted` so it can be
//! applied again (redo). A failed call leaves the state where it was.

mod batch;
mod copy;
mod delete;
mod move_op;
mod rotate;
mod transfer;

pub use batch::{BatchOperation, BatchSummary, MemberStatus};
pub use copy::CopyOperation;
pub use delete::DeleteOperation;
pub use move_op::MoveOperation;
pub use rotate::RotateOperation;

use crate::error::OperationResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where an operation is in its apply/revert cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Unexecuted,
    Applied,
}

/// Which variant an operation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Copy,
    Move,
    Delete,
    Rotate,
    Batch,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Copy => write!(f, "Copy"),
            OperationKind::Move => write!(f, "Move"),
            OperationKind::Delete => write!(f, "Delete"),
            OperationKind::Rotate => write!(f, "Rotate"),
            OperationKind::Batch => write!(f, "Batch"),
        }
    }
}

/// An undoable action on the filesystem.
///
/// Implementors own all state needed to revert themselves. Both methods
/// re-check the filesystem at call time and never panic on I/O failure.
pub trait FileOperation: Send + fmt::Debug {
    fn kind(&self) -> OperationKind;

    /// Human-readable label, fixed at construction
    fn description(&self) -> &str;

    fn state(&self) -> OperationState;

    /// Perform the action. On failure nothing observable has changed.
    fn apply(&mut self) -> OperationResult<()>;

    /// Undo a successful `apply`. Fails without effect if never applied.
    fn revert(&mut self) -> OperationResult<()>;

    /// Source paths this operation acts on, for callers tracking processed files
    fn affected_paths(&self) -> Vec<PathBuf>;

    /// Per-member counts for composite operations
    fn batch_summary(&self) -> Option<BatchSummary> {
        None
    }

    /// Snapshot of what this operation did, handed back to callers
    fn report(&self) -> OperationReport {
        OperationReport {
            kind: self.kind(),
            description: self.description().to_string(),
            affected_paths: self.affected_paths(),
            summary: self.batch_summary(),
        }
    }
}

/// What a completed execute/undo/redo acted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub description: String,
    pub affected_paths: Vec<PathBuf>,
    pub summary: Option<BatchSummary>,
}

/// File name used in descriptions; falls back to the full path
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
