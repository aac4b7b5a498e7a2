//! Delete a file, keeping its contents in memory for undo.

use super::transfer::write_no_clobber;
use super::{display_name, FileOperation, OperationKind, OperationState};
use crate::error::{OperationError, OperationResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Deletes `path` after reading its full contents into a backup buffer.
///
/// The backup lives as long as the operation is applied. Undo writes it
/// back to the original path, recreating parent folders if needed, and
/// refuses to overwrite a file that appeared there in the meantime.
pub struct DeleteOperation {
    path: PathBuf,
    backup: Option<Vec<u8>>,
    description: String,
}

impl DeleteOperation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!("Delete {}", display_name(&path));
        Self {
            path,
            backup: None,
            description,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the captured backup, if any
    pub fn backup_len(&self) -> Option<usize> {
        self.backup.as_ref().map(Vec::len)
    }
}

impl std::fmt::Debug for DeleteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteOperation")
            .field("path", &self.path)
            .field("backup_len", &self.backup_len())
            .field("description", &self.description)
            .finish()
    }
}

impl FileOperation for DeleteOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Delete
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn state(&self) -> OperationState {
        if self.backup.is_some() {
            OperationState::Applied
        } else {
            OperationState::Unexecuted
        }
    }

    fn apply(&mut self) -> OperationResult<()> {
        if self.backup.is_some() {
            return Err(OperationError::AlreadyApplied {
                description: self.description.clone(),
            });
        }

        // Never delete without a backup in hand
        let bytes = fs::read(&self.path).map_err(|e| OperationError::from_io(&self.path, e))?;
        fs::remove_file(&self.path).map_err(|e| OperationError::from_io(&self.path, e))?;

        debug!(path = ?self.path, bytes = bytes.len(), "deleted");
        self.backup = Some(bytes);
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        let Some(bytes) = self.backup.as_deref() else {
            return Err(OperationError::NoBackup {
                path: self.path.clone(),
            });
        };

        if let Err(e) = write_no_clobber(&self.path, bytes) {
            warn!(path = ?self.path, error = %e, "could not restore deleted file");
            return Err(e);
        }

        debug!(path = ?self.path, bytes = bytes.len(), "restored");
        self.backup = None;
        Ok(())
    }

    fn affected_paths(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}
