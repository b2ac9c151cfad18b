//! Terminal sync notifier

use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use async_trait::async_trait;
use leetsync::error::Error;
use leetsync::sync::{Notification, SyncNotifier};
use leetsync::types::SubmissionRecord;

/// Prints sync outcomes to stdout
///
/// Not for host mode, where stdout carries protocol frames.
pub struct CliNotifier;

#[async_trait]
impl SyncNotifier for CliNotifier {
    async fn on_synced(&self, record: &SubmissionRecord, updated: bool) {
        let note = Notification::synced(&record.filename(), updated);
        println!("{} {} {}", check(), note.title.emphasis(), note.message);
    }

    async fn on_failed(&self, record: &SubmissionRecord, error: &Error) {
        let note = Notification::failed(&record.filename());
        println!("{} {} {}", cross(), note.title.emphasis(), note.message);
        println!("  {}", error.muted());
    }

    async fn on_pending_count(&self, count: usize) {
        println!("  {} {}", "Pending syncs:".muted(), count.accent());
    }
}
