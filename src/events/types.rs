//! Event type definitions for history notifications and load progress.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the picture sorter core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Undo/redo history events
    History(HistoryEvent),
    /// Folder loading events
    Load(LoadEvent),
}

/// Events from the command history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// The stacks changed; carries the new read-only view
    StateChanged(HistorySnapshot),
    /// A new operation was applied and recorded
    Executed { description: String },
    /// The most recent operation was reverted
    Undone { description: String },
    /// The most recently undone operation was re-applied
    Redone { description: String },
    /// An execute/undo/redo attempt failed; stacks are unchanged
    Failed {
        action: HistoryAction,
        description: String,
        message: String,
    },
}

/// Which history entry point produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Execute,
    Undo,
    Redo,
}

/// Immutable view of the undo/redo stacks for observers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub can_undo: bool,
    pub can_redo: bool,
    /// Description of the operation `undo()` would revert
    pub undo_description: Option<String>,
    /// Description of the operation `redo()` would re-apply
    pub redo_description: Option<String>,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Events while loading images from a folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoadEvent {
    /// Loading has started
    Started { folder: PathBuf },
    /// Progress update while annotating images
    Progress(LoadProgress),
    /// An image was annotated and added to the result
    ImageLoaded { path: PathBuf },
    /// An error occurred but loading continues
    Error { path: PathBuf, message: String },
    /// The caller cancelled; `loaded` items were kept
    Cancelled { loaded: usize },
    /// Loading completed
    Completed { total: usize },
}

/// Progress information while loading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Images annotated so far
    pub loaded: usize,
    /// Images found in the folder
    pub total: usize,
    /// Image currently being read
    pub current_path: PathBuf,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryAction::Execute => write!(f, "Execute"),
            HistoryAction::Undo => write!(f, "Undo"),
            HistoryAction::Redo => write!(f, "Redo"),
        }
    }
}
