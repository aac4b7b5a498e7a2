//! Mutex-serialized history for several callers.

use super::CommandHistory;
use crate::core::operations::{FileOperation, OperationReport};
use crate::error::HistoryError;
use crate::events::HistorySnapshot;
use std::sync::{Mutex, MutexGuard};

/// A `CommandHistory` behind a mutex.
///
/// Each call holds the lock for its full duration, so execute/undo/redo from
/// different threads run one at a time and each finishes before returning.
#[derive(Debug)]
pub struct SharedHistory(Mutex<CommandHistory>);

impl SharedHistory {
    pub fn new(history: CommandHistory) -> Self {
        Self(Mutex::new(history))
    }

    fn lock(&self) -> Result<MutexGuard<'_, CommandHistory>, HistoryError> {
        self.0.lock().map_err(|_| HistoryError::Poisoned)
    }

    pub fn execute(&self, op: Box<dyn FileOperation>) -> Result<OperationReport, HistoryError> {
        self.lock()?.execute(op)
    }

    pub fn undo(&self) -> Result<OperationReport, HistoryError> {
        self.lock()?.undo()
    }

    pub fn redo(&self) -> Result<OperationReport, HistoryError> {
        self.lock()?.redo()
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<HistorySnapshot, HistoryError> {
        Ok(self.lock()?.snapshot())
    }

    /// Take back the inner history
    pub fn into_inner(self) -> Result<CommandHistory, HistoryError> {
        self.0.into_inner().map_err(|_| HistoryError::Poisoned)
    }
}

impl Default for SharedHistory {
    fn default() -> Self {
        Self::new(CommandHistory::new())
    }
}

impl From<CommandHistory> for SharedHistory {
    fn from(history: CommandHistory) -> Self {
        Self::new(history)
    }
}
