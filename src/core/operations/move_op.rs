//! Move a file into a target folder.

use super::transfer::{destination_for, move_no_clobber, within_dir};
use super::{display_name, FileOperation, OperationKind, OperationState};
use crate::error::{OperationError, OperationResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Moves `source` into `target_folder`; undo moves it back to the exact
/// original path.
#[derive(Debug)]
pub struct MoveOperation {
    source: PathBuf,
    target_folder: PathBuf,
    resolved_target: Option<PathBuf>,
    description: String,
}

impl MoveOperation {
    pub fn new(source: impl Into<PathBuf>, target_folder: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let description = format!("Move {}", display_name(&source));
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

    pub fn resolved_target(&self) -> Option<&Path> {
        self.resolved_target.as_deref()
    }
}

impl FileOperation for MoveOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Move
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
        if !self.source.is_file() {
            return Err(OperationError::NotFound {
                path: self.source.clone(),
            });
        }

        let dest = destination_for(&self.source, &self.target_folder)?;
        within_dir(&self.target_folder, || move_no_clobber(&self.source, &dest))?;

        debug!(source = ?self.source, target = ?dest, "moved");
        self.resolved_target = Some(dest);
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        let Some(dest) = self.resolved_target.as_ref() else {
            return Err(OperationError::NotApplied {
                description: self.description.clone(),
            });
        };
        if fs::symlink_metadata(dest).is_err() {
            return Err(OperationError::NotFound { path: dest.clone() });
        }

        match self.source.parent() {
            Some(parent) => within_dir(parent, || move_no_clobber(dest, &self.source))?,
            None => move_no_clobber(dest, &self.source)?,
        }

        debug!(source = ?dest, target = ?self.source, "moved back");
        self.resolved_target = None;
        Ok(())
    }

    fn affected_paths(&self) -> Vec<PathBuf> {
        vec![self.source.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operations::test_support::write_file;
    use crate::error::OperationErrorKind;
    use tempfile::TempDir;

    #[test]
    fn move_then_undo_restores_exact_path() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = write_file(src.path(), "a.jpg", b"photo bytes");

        let mut op = MoveOperation::new(&source, dest.path().join("keep"));
        op.apply().unwrap();

        assert!(!source.exists());
        assert!(dest.path().join("keep/a.jpg").exists());

        op.revert().unwrap();

        assert_eq!(fs::read(&source).unwrap(), b"photo bytes");
        assert!(!dest.path().join("keep/a.jpg").exists());
        assert_eq!(op.state(), OperationState::Unexecuted);
    }

    #[test]
    fn collision_leaves_source_untouched() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = write_file(src.path(), "a.jpg", b"mine");
        write_file(dest.path(), "a.jpg", b"theirs");

        let mut op = MoveOperation::new(&source, dest.path());
        let err = op.apply().unwrap_err();

        assert_eq!(err.kind(), OperationErrorKind::AlreadyExists);
        assert_eq!(fs::read(&source).unwrap(), b"mine");
        assert_eq!(fs::read(dest.path().join("a.jpg")).unwrap(), b"theirs");
    }

    #[test]
    fn revert_fails_when_moved_file_vanished() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = write_file(src.path(), "a.jpg", b"photo");

        let mut op = MoveOperation::new(&source, dest.path());
        op.apply().unwrap();
        fs::remove_file(dest.path().join("a.jpg")).unwrap();

        let err = op.revert().unwrap_err();
        assert_eq!(err.kind(), OperationErrorKind::NotFound);
        assert_eq!(op.state(), OperationState::Applied);
    }

    #[test]
    fn revert_recreates_source_folder() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let folder = src.path().join("album");
        fs::create_dir(&folder).unwrap();
        let source = write_file(&folder, "a.jpg", b"photo");

        let mut op = MoveOperation::new(&source, dest.path());
        op.apply().unwrap();
        fs::remove_dir(&folder).unwrap();

        op.revert().unwrap();
        assert!(source.exists());
    }

    #[test]
    fn missing_source_leaves_no_target_folder() {
        let src = TempDir::new().unwrap();
        let mut op = MoveOperation::new(src.path().join("gone.jpg"), src.path().join("out/keep"));

        let err = op.apply().unwrap_err();

        assert_eq!(err.kind(), OperationErrorKind::NotFound);
        assert!(!src.path().join("out").exists());
    }

    #[test]
    fn reapply_after_revert_moves_again() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = write_file(src.path(), "a.jpg", b"photo");

        let mut op = MoveOperation::new(&source, dest.path());
        op.apply().unwrap();
        op.revert().unwrap();
        op.apply().unwrap();

        assert!(!source.exists());
        assert!(dest.path().join("a.jpg").exists());
    }
}
