//! Copy a file into a target folder.

use super::transfer::{copy_no_clobber, destination_for, remove_if_present, within_dir};
use super::{display_name, FileOperation, OperationKind, OperationState};
use crate::error::{OperationError, OperationResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies `source` into `target_folder`, keeping the file name.
///
/// An existing file of the same name at the destination is never
/// overwritten; `apply` fails with `AlreadyExists` instead.
#[derive(Debug)]
pub struct CopyOperation {
    source: PathBuf,
    target_folder: PathBuf,
    resolved_target: Option<PathBuf>,
    description: String,
}

impl CopyOperation {
    pub fn new(source: impl Into<PathBuf>, target_folder: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let description = format!("Copy {}", display_name(&source));
        Self {
            source,
            target_folder: target_folder.into(),
            resolved_target: None,
            description,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target_folder(&self) -> &Path {
        &self.target_folder
    }

    /// Where the copy landed, once applied
    pub fn resolved_target(&self) -> Option<&Path> {
        self.resolved_target.as_deref()
    }
}

impl FileOperation for CopyOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Copy
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn state(&self) -> OperationState {
        if self.resolved_target.is_some() {
            OperationState::Applied
        } else {
            OperationState::Unexecuted
        }
    }

    fn apply(&mut self) -> OperationResult<()> {
        if self.resolved_target.is_some() {
            return Err(OperationError::AlreadyApplied {
                description: self.description.clone(),
            });
        }

        let dest = destination_for(&self.source, &self.target_folder)?;
        let bytes = within_dir(&self.target_folder, || copy_no_clobber(&self.source, &dest))?;

        debug!(source = ?self.source, target = ?dest, bytes, "copied");
        self.resolved_target = Some(dest);
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        let Some(dest) = self.resolved_target.as_ref() else {
            return Err(OperationError::NotApplied {
                description: self.description.clone(),
            });
        };

        // Already deleted externally: nothing left to undo
        let removed = remove_if_present(dest)?;
        debug!(target = ?dest, removed, "reverted copy");
        self.resolved_target = None;
        Ok(())
    }

    fn affected_paths(&self) -> Vec<PathBuf> {
        vec![self.source.clone()]
    }
}
