//! Board state and its synchronization with the remote task service.

pub mod controller;
pub mod notify;
pub mod queue;
pub mod sequence;
pub mod state;

pub use controller::{SyncController, SyncOutcome};
pub use notify::Notifier;
pub use queue::{ChecklistQueue, FailedItem, FlushReport};
pub use sequence::SequenceTracker;
pub use state::{BoardStore, SharedStore};
