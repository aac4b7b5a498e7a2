//! Undo/redo stack implementation.

use crate::core::operations::{FileOperation, OperationReport};
use crate::error::HistoryError;
use crate::events::{
    null_sender, Event, EventSender, HistoryAction, HistoryEvent, HistorySnapshot,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Undo depth used when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Configuration for a command history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undoable operations kept (0 = keep none)
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builder for a command history
pub struct HistoryBuilder {
    config: HistoryConfig,
    events: Option<EventSender>,
}

impl HistoryBuilder {
    /// Create a new history builder
    pub fn new() -> Self {
        Self {
            config: HistoryConfig::default(),
            events: None,
        }
    }

    /// Set the undo depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Send state-changed notifications to this channel
    pub fn events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Build the history
    pub fn build(self) -> CommandHistory {
        CommandHistory {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: self.config.max_depth,
            events: self.events.unwrap_or_else(null_sender),
        }
    }
}

impl Default for HistoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear undo/redo history.
///
/// Owns every operation pushed into it. Methods take `&mut self`, so one
/// owner drives it at a time; wrap it in `SharedHistory` for several callers.
#[derive(Debug)]
pub struct CommandHistory {
    /// Oldest at the front, most recent at the back
    undo_stack: VecDeque<Box<dyn FileOperation>>,
    /// Most recently undone at the back
    redo_stack: Vec<Box<dyn FileOperation>>,
    max_depth: usize,
    events: EventSender,
}

impl CommandHistory {
    /// A history with the default depth and no observers
    pub fn new() -> Self {
        HistoryBuilder::new().build()
    }

    pub fn builder() -> HistoryBuilder {
        HistoryBuilder::new()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Description of the operation `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|op| op.description())
    }

    /// Description of the operation `redo` would re-apply
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|op| op.description())
    }

    /// Read-only view of both stacks
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_description: self.undo_description().map(str::to_string),
            redo_description: self.redo_description().map(str::to_string),
            undo_depth: self.undo_stack.len(),
            redo_depth: self.redo_stack.len(),
        }
    }

    /// Apply `op` and record it for undo.
    ///
    /// On failure the stacks are untouched and the operation is dropped.
    pub fn execute(&mut self, mut op: Box<dyn FileOperation>) -> Result<OperationReport, HistoryError> {
        if let Err(source) = op.apply() {
            let description = op.description().to_string();
            self.notify_failure(HistoryAction::Execute, &description, &source);
            return Err(HistoryError::Execute {
                description,
                source,
            });
        }

        let report = op.report();
        info!(operation = %report.description, "executed");

        self.redo_stack.clear();
        self.undo_stack.push_back(op);
        self.truncate();

        self.emit(HistoryEvent::Executed {
            description: report.description.clone(),
        });
        self.notify_state();
        Ok(report)
    }

    /// Revert the most recent operation.
    ///
    /// If the revert fails, the operation goes back on top of the undo stack.
    pub fn undo(&mut self) -> Result<OperationReport, HistoryError> {
        let mut op = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;

        // Report before reverting: a batch only lists its applied members
        let report = op.report();
        if let Err(source) = op.revert() {
            let description = op.description().to_string();
            self.undo_stack.push_back(op);
            self.notify_failure(HistoryAction::Undo, &description, &source);
            return Err(HistoryError::Undo {
                description,
                source,
            });
        }

        info!(operation = %report.description, "undone");
        self.redo_stack.push(op);

        self.emit(HistoryEvent::Undone {
            description: report.description.clone(),
        });
        self.notify_state();
        Ok(report)
    }

    /// Re-apply the most recently undone operation.
    pub fn redo(&mut self) -> Result<OperationReport, HistoryError> {
        let mut op = self.redo_stack.pop().ok_or(HistoryError::NothingToRedo)?;

        if let Err(source) = op.apply() {
            let description = op.description().to_string();
            self.redo_stack.push(op);
            self.notify_failure(HistoryAction::Redo, &description, &source);
            return Err(HistoryError::Redo {
                description,
                source,
            });
        }

        let report = op.report();
        info!(operation = %report.description, "redone");
        self.undo_stack.push_back(op);

        self.emit(HistoryEvent::Redone {
            description: report.description.clone(),
        });
        self.notify_state();
        Ok(report)
    }

    /// Discard both stacks without reverting anything.
    pub fn clear(&mut self) {
        let dropped = self.undo_stack.len() + self.redo_stack.len();
        self.undo_stack.clear();
        self.redo_stack.clear();
        debug!(dropped, "history cleared");
        self.notify_state();
    }

    fn truncate(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(operation = dropped.description(), "dropped from history");
            }
        }
    }

    fn emit(&self, event: HistoryEvent) {
        self.events.send(Event::History(event));
    }

    fn notify_state(&self) {
        self.emit(HistoryEvent::StateChanged(self.snapshot()));
    }

    fn notify_failure(
        &self,
        action: HistoryAction,
        description: &str,
        error: &crate::error::OperationError,
    ) {
        warn!(%action, operation = description, error = %error, "history action failed");
        self.emit(HistoryEvent::Failed {
            action,
            description: description.to_string(),
            message: error.to_string(),
        });
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operations::{OperationKind, OperationState};
    use crate::error::{OperationError, OperationErrorKind, OperationResult};
    use crate::events::EventChannel;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// In-memory operation that logs calls and can be told to fail
    #[derive(Debug)]
    struct Probe {
        name: String,
        applied: bool,
        log: Arc<Mutex<Vec<String>>>,
        fail_apply: Arc<Mutex<bool>>,
        fail_revert: Arc<Mutex<bool>>,
    }

    struct Switches {
        log: Arc<Mutex<Vec<String>>>,
        fail_apply: Arc<Mutex<bool>>,
        fail_revert: Arc<Mutex<bool>>,
    }

    impl Switches {
        fn new() -> Self {
            Self {
                log: Arc::default(),
                fail_apply: Arc::default(),
                fail_revert: Arc::default(),
            }
        }

        fn probe(&self, name: &str) -> Box<dyn FileOperation> {
            Box::new(Probe {
                name: name.to_string(),
                applied: false,
                log: Arc::clone(&self.log),
                fail_apply: Arc::clone(&self.fail_apply),
                fail_revert: Arc::clone(&self.fail_revert),
            })
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl FileOperation for Probe {
        fn kind(&self) -> OperationKind {
            OperationKind::Copy
        }

        fn description(&self) -> &str {
            &self.name
        }

        fn state(&self) -> OperationState {
            if self.applied {
                OperationState::Applied
            } else {
                OperationState::Unexecuted
            }
        }

        fn apply(&mut self) -> OperationResult<()> {
            if *self.fail_apply.lock().unwrap() {
                return Err(OperationError::AlreadyExists {
                    path: PathBuf::from(&self.name),
                });
            }
            self.applied = true;
            self.log.lock().unwrap().push(format!("apply {}", self.name));
            Ok(())
        }

        fn revert(&mut self) -> OperationResult<()> {
            if *self.fail_revert.lock().unwrap() {
                return Err(OperationError::NotFound {
                    path: PathBuf::from(&self.name),
                });
            }
            self.applied = false;
            self.log.lock().unwrap().push(format!("revert {}", self.name));
            Ok(())
        }

        fn affected_paths(&self) -> Vec<PathBuf> {
            vec![PathBuf::from(&self.name)]
        }
    }

    #[test]
    fn undo_all_then_redo_all_restores_order() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        for name in ["a", "b", "c"] {
            history.execute(switches.probe(name)).unwrap();
        }

        while history.can_undo() {
            history.undo().unwrap();
        }
        while history.can_redo() {
            history.redo().unwrap();
        }

        assert_eq!(
            switches.log(),
            vec![
                "apply a", "apply b", "apply c", "revert c", "revert b", "revert a", "apply a",
                "apply b", "apply c"
            ]
        );
        assert_eq!(history.undo_description(), Some("c"));
        assert_eq!(history.undo_len(), 3);
        assert!(!history.can_redo());
    }

    #[test]
    fn execute_after_undo_discards_redo() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        history.execute(switches.probe("a")).unwrap();
        history.execute(switches.probe("b")).unwrap();
        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(history.redo_len(), 2);

        history.execute(switches.probe("c")).unwrap();

        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let switches = Switches::new();
        let mut history = CommandHistory::builder().max_depth(2).build();
        for name in ["a", "b", "c"] {
            history.execute(switches.probe(name)).unwrap();
        }

        assert_eq!(history.undo_len(), 2);
        assert!(history.can_undo());

        history.undo().unwrap();
        history.undo().unwrap();
        assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));
        // "a" was dropped, never reverted
        assert!(!switches.log().contains(&"revert a".to_string()));
    }

    #[test]
    fn builder_takes_whole_config() {
        assert_eq!(CommandHistory::new().max_depth(), DEFAULT_MAX_DEPTH);

        let history = CommandHistory::builder()
            .config(HistoryConfig { max_depth: 7 })
            .build();
        assert_eq!(history.max_depth(), 7);
    }

    #[test]
    fn zero_depth_still_executes() {
        let switches = Switches::new();
        let mut history = CommandHistory::builder().max_depth(0).build();

        history.execute(switches.probe("a")).unwrap();

        assert_eq!(switches.log(), vec!["apply a"]);
        assert!(!history.can_undo());
    }

    #[test]
    fn failed_execute_leaves_stacks_unchanged() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        history.execute(switches.probe("a")).unwrap();
        history.undo().unwrap();
        let before = history.snapshot();

        *switches.fail_apply.lock().unwrap() = true;
        let err = history.execute(switches.probe("b")).unwrap_err();

        assert!(matches!(err, HistoryError::Execute { .. }));
        assert_eq!(history.snapshot(), before);
        assert!(history.can_redo());
    }

    #[test]
    fn failed_undo_pushes_operation_back() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        history.execute(switches.probe("a")).unwrap();
        history.execute(switches.probe("b")).unwrap();
        let before = history.snapshot();

        *switches.fail_revert.lock().unwrap() = true;
        let err = history.undo().unwrap_err();

        assert_eq!(
            err.operation_error().map(OperationError::kind),
            Some(OperationErrorKind::NotFound)
        );
        assert_eq!(history.snapshot(), before);
        assert_eq!(history.undo_description(), Some("b"));
    }

    #[test]
    fn failed_redo_pushes_operation_back() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        history.execute(switches.probe("a")).unwrap();
        history.undo().unwrap();

        *switches.fail_apply.lock().unwrap() = true;
        assert!(matches!(history.redo(), Err(HistoryError::Redo { .. })));

        assert_eq!(history.redo_description(), Some("a"));
        assert!(!history.can_undo());
    }

    #[test]
    fn empty_history_reports_nothing_to_do() {
        let mut history = CommandHistory::new();
        assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
        assert_eq!(history.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn clear_discards_without_reverting() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();
        history.execute(switches.probe("a")).unwrap();
        history.execute(switches.probe("b")).unwrap();
        history.undo().unwrap();

        history.clear();

        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(switches.log(), vec!["apply a", "apply b", "revert b"]);
    }

    #[test]
    fn state_changes_are_published() {
        let switches = Switches::new();
        let (sender, receiver) = EventChannel::new();
        let mut history = CommandHistory::builder().events(sender).build();

        history.execute(switches.probe("a")).unwrap();
        history.undo().unwrap();

        let snapshots: Vec<HistorySnapshot> = std::iter::from_fn(|| receiver.try_recv())
            .filter_map(|event| match event {
                Event::History(HistoryEvent::StateChanged(s)) => Some(s),
                _ => None,
            })
            .collect();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].undo_description.as_deref(), Some("a"));
        assert!(snapshots[1].can_redo);
        assert!(!snapshots[1].can_undo);
    }

    #[test]
    fn reports_carry_affected_paths() {
        let switches = Switches::new();
        let mut history = CommandHistory::new();

        let report = history.execute(switches.probe("a.jpg")).unwrap();
        assert_eq!(report.affected_paths, vec![PathBuf::from("a.jpg")]);

        let undone = history.undo().unwrap();
        assert_eq!(undone.description, "a.jpg");
    }
}
