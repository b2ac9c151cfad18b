//! Sync engine and its collaborators

mod engine;
pub mod header;
mod notify;

pub use engine::{
    DrainReport, QueueReason, SyncEngine, SyncOutcome, UPDATE_MESSAGE, create_message,
    placeholder_path, placeholder_text,
};
pub use notify::{LogNotifier, NoopNotifier, Notification, SyncNotifier};
