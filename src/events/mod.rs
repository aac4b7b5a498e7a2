//! # Events Module
//!
//! Event-driven notifications for whatever UI sits on top of the core.
//!
//! ## Design
//! The command history and the image loader emit events through channels,
//! so a CLI, GUI or test can observe undo/redo state and load progress
//! without polling shared fields.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let mut history = CommandHistory::builder().events(sender).build();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::History(HistoryEvent::StateChanged(snapshot)) = event {
//!             println!("undo: {:?}", snapshot.undo_description);
//!         }
//!     }
//! });
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
