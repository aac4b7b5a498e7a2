//! # Core Module
//!
//! The GUI-agnostic sorting engine.
//!
//! ## Modules
//! - `metadata` - Reads EXIF orientation and GPS position
//! - `operations` - Undoable copy/move/delete/rotate and best-effort batches
//! - `history` - Bounded undo/redo over operations
//! - `scanner` - Lists and annotates the images in a folder

pub mod history;
pub mod metadata;
pub mod operations;
pub mod scanner;

// Re-export commonly used types
pub use history::{CommandHistory, HistoryConfig};
pub use metadata::{GpsCoordinates, ImageMetadata, MetadataReader, Rotation};
pub use operations::{BatchSummary, FileOperation, OperationReport};
pub use scanner::{CancellationToken, ImageItem, ImageLoader, LoadConfig};
