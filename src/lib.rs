//! # Picture Sorter
//!
//! An undoable file-operation engine for sorting photos into folders.
//!
//! ## Core Philosophy
//! - **Everything is undoable** - copy, move, delete and rotate all keep what
//!   they need to reverse themselves
//! - **Never clobber** - an existing file at the destination is a skip, not an overwrite
//! - **Fail cleanly** - a failed action or undo leaves files and history as they were
//!
//! ## Architecture
//! - `core` - metadata reading, file operations, undo/redo history, folder loading
//! - `events` - state-changed and load-progress notifications (GUI-ready)
//! - `error` - error taxonomy callers can branch on

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::history::{CommandHistory, SharedHistory};
pub use crate::core::operations::{
    BatchOperation, CopyOperation, DeleteOperation, FileOperation, MoveOperation, RotateOperation,
};
pub use error::{Result, SorterError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// controls verbosity; calling it twice keeps the first subscriber.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
