//! Best-effort composite of file operations.

use super::{CopyOperation, FileOperation, MoveOperation, OperationKind, OperationState};
use crate::error::{OperationError, OperationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-member counts from the first apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// Destination already held a file of the same name
    pub skipped: usize,
    pub errored: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.errored
    }
}

/// What happened to one member of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberStatus {
    Pending,
    Applied,
    /// Applied once, then undone; redo applies it again
    Reverted,
    Skipped,
    Failed(String),
}

impl MemberStatus {
    /// Members that belong to the undoable subset
    fn is_recorded(&self) -> bool {
        matches!(self, MemberStatus::Applied | MemberStatus::Reverted)
    }
}

#[derive(Debug)]
struct Member {
    op: Box<dyn FileOperation>,
    status: MemberStatus,
}

/// Runs every member independently; succeeds if at least one member did.
///
/// Only members that actually applied are recorded, so undo reverts
/// exactly what was done. Undo and redo are all-or-nothing across that
/// recorded subset: if any member fails, the others are rolled back to
/// where they were before the call.
#[derive(Debug)]
pub struct BatchOperation {
    description: String,
    members: Vec<Member>,
    summary: BatchSummary,
    committed: bool,
}

impl BatchOperation {
    pub fn new(description: impl Into<String>, ops: Vec<Box<dyn FileOperation>>) -> Self {
        Self {
            description: description.into(),
            members: ops
                .into_iter()
                .map(|op| Member {
                    op,
                    status: MemberStatus::Pending,
                })
                .collect(),
            summary: BatchSummary::default(),
            committed: false,
        }
    }

    /// Copy every source into `target_folder`
    pub fn copy_all<I, P>(sources: I, target_folder: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let target_folder = target_folder.into();
        let ops: Vec<Box<dyn FileOperation>> = sources
            .into_iter()
            .map(|s| Box::new(CopyOperation::new(s, target_folder.clone())) as Box<dyn FileOperation>)
            .collect();
        Self::new(format!("Copy {} image(s)", ops.len()), ops)
    }

    /// Move every source into `target_folder`
    pub fn move_all<I, P>(sources: I, target_folder: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let target_folder = target_folder.into();
        let ops: Vec<Box<dyn FileOperation>> = sources
            .into_iter()
            .map(|s| Box::new(MoveOperation::new(s, target_folder.clone())) as Box<dyn FileOperation>)
            .collect();
        Self::new(format!("Move {} image(s)", ops.len()), ops)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Description and status of each member, in order
    pub fn member_statuses(&self) -> Vec<(String, MemberStatus)> {
        self.members
            .iter()
            .map(|m| (m.op.description().to_string(), m.status.clone()))
            .collect()
    }

    fn has_status(&self, status: &MemberStatus) -> bool {
        self.members.iter().any(|m| &m.status == status)
    }

    fn apply_first(&mut self) -> OperationResult<()> {
        let mut summary = BatchSummary::default();

        for member in &mut self.members {
            member.status = match member.op.apply() {
                Ok(()) => {
                    summary.succeeded += 1;
                    MemberStatus::Applied
                }
                Err(e) if e.is_already_exists() => {
                    debug!(member = member.op.description(), "skipped, destination exists");
                    summary.skipped += 1;
                    MemberStatus::Skipped
                }
                Err(e) => {
                    warn!(member = member.op.description(), error = %e, "batch member failed");
                    summary.errored += 1;
                    MemberStatus::Failed(e.to_string())
                }
            };
        }

        self.summary = summary;
        if summary.succeeded == 0 {
            for member in &mut self.members {
                member.status = MemberStatus::Pending;
            }
            return Err(OperationError::BatchFailed { summary });
        }

        info!(
            batch = %self.description,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            errored = summary.errored,
            "batch applied"
        );
        self.committed = true;
        Ok(())
    }

    fn reapply_recorded(&mut self) -> OperationResult<()> {
        let mut reapplied = Vec::new();
        let mut failure = None;

        for (index, member) in self.members.iter_mut().enumerate() {
            if member.status != MemberStatus::Reverted {
                continue;
            }
            match member.op.apply() {
                Ok(()) => {
                    member.status = MemberStatus::Applied;
                    reapplied.push(index);
                }
                Err(e) => {
                    warn!(member = member.op.description(), error = %e, "batch redo failed");
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            Some(e) => {
                self.roll_back(&reapplied);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Revert members re-applied during a failed redo.
    fn roll_back(&mut self, indices: &[usize]) {
        for &index in indices.iter().rev() {
            let member = &mut self.members[index];
            match member.op.revert() {
                Ok(()) => member.status = MemberStatus::Reverted,
                Err(e) => {
                    warn!(member = member.op.description(), error = %e, "could not roll back redo")
                }
            }
        }
    }
}

impl FileOperation for BatchOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Batch
    }

    fn description(&self) -> &str {
        &self.description
    }

    /// Applied once every recorded member is applied
    fn state(&self) -> OperationState {
        if self.committed && !self.has_status(&MemberStatus::Reverted) {
            OperationState::Applied
        } else {
            OperationState::Unexecuted
        }
    }

    fn apply(&mut self) -> OperationResult<()> {
        if !self.committed {
            return self.apply_first();
        }
        // A member whose rollback failed may still be applied; redo the rest
        if !self.has_status(&MemberStatus::Reverted) {
            return Err(OperationError::AlreadyApplied {
                description: self.description.clone(),
            });
        }
        self.reapply_recorded()
    }

    fn revert(&mut self) -> OperationResult<()> {
        if !self.has_status(&MemberStatus::Applied) {
            return Err(OperationError::NotApplied {
                description: self.description.clone(),
            });
        }

        let mut reverted = Vec::new();
        let mut failed = 0;
        for index in (0..self.members.len()).rev() {
            let member = &mut self.members[index];
            if member.status != MemberStatus::Applied {
                continue;
            }
            match member.op.revert() {
                Ok(()) => {
                    member.status = MemberStatus::Reverted;
                    reverted.push(index);
                }
                Err(e) => {
                    warn!(member = member.op.description(), error = %e, "batch undo failed");
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            debug!(batch = %self.description, reverted = reverted.len(), "batch reverted");
            return Ok(());
        }

        // Restore the members we did undo so the batch stays fully applied
        for &index in reverted.iter().rev() {
            let member = &mut self.members[index];
            match member.op.apply() {
                Ok(()) => member.status = MemberStatus::Applied,
                Err(e) => {
                    warn!(member = member.op.description(), error = %e, "could not re-apply after failed undo")
                }
            }
        }
        Err(OperationError::BatchRevert {
            reverted: reverted.len(),
            failed,
        })
    }

    fn affected_paths(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .filter(|m| m.status.is_recorded())
            .flat_map(|m| m.op.affected_paths())
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    fn batch_summary(&self) -> Option<BatchSummary> {
        Some(self.summary)
    }
}
