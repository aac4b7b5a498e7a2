//! # History Module
//!
//! Bounded linear undo/redo over `FileOperation`s.
//!
//! ## Rules
//! - `execute` applies an operation and records it only if it succeeded
//! - Any new execute discards the redo stack
//! - The undo stack is capped at `max_depth`; the oldest entries are
//!   dropped without being reverted
//! - A failed undo/redo puts the operation back where it was
//!
//! Observers get a `HistorySnapshot` through the event channel after every
//! change instead of reading the stacks.

mod manager;
mod shared;

pub use manager::{CommandHistory, HistoryBuilder, HistoryConfig, DEFAULT_MAX_DEPTH};
pub use shared::SharedHistory;
