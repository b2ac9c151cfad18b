//! Replay command - run a recorded page session through the watcher

use crate::cli::cli_engine;
use crate::cli::style::{Stylize, check};
use anstream::println;
use async_trait::async_trait;
use leetsync::config::Config;
use leetsync::editor::{EditorBridge, EditorExtractor, serve_bridge};
use leetsync::error::Result;
use leetsync::messages::Dispatcher;
use leetsync::page::{ChangeFeed, SnapshotPage};
use leetsync::sync::header::render_file;
use leetsync::types::SubmissionRecord;
use leetsync::watcher::replay::{TraceModels, parse_trace, replay};
use leetsync::watcher::{SubmissionSink, SubmissionWatcher, WatcherOptions};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Collects records instead of syncing them
#[derive(Default)]
struct PrintSink {
    records: Mutex<Vec<SubmissionRecord>>,
}

#[async_trait]
impl SubmissionSink for PrintSink {
    async fn dispatch(&self, record: SubmissionRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// Run the replay command
pub async fn run_replay(config: &Config, trace: &Path, dry_run: bool) -> Result<()> {
    let steps = parse_trace(&std::fs::read_to_string(trace)?)?;
    let initial_url = steps.iter().find_map(|s| s.url.clone()).unwrap_or_default();

    let page = Arc::new(SnapshotPage::new(initial_url, ""));
    let models = Arc::new(TraceModels::default());
    let feed = ChangeFeed::new();

    let (bridge, requests) = EditorBridge::channel(8);
    let bridge_task = tokio::spawn(serve_bridge(models.clone(), requests, bridge.clone()));
    let extractor = Arc::new(EditorExtractor::new(
        Some(bridge),
        Duration::from_millis(config.bridge_timeout_ms),
        config.min_code_len,
    ));

    let printed = Arc::new(PrintSink::default());
    let dispatcher = if dry_run {
        None
    } else {
        Some(Arc::new(Dispatcher::new(
            Arc::new(cli_engine(config)?),
            config.min_code_len,
        )))
    };
    let sink: Arc<dyn SubmissionSink> = match &dispatcher {
        Some(d) => Arc::clone(d) as Arc<dyn SubmissionSink>,
        None => Arc::clone(&printed) as Arc<dyn SubmissionSink>,
    };

    let watcher = Arc::new(SubmissionWatcher::new(
        page.clone(),
        extractor,
        sink,
        WatcherOptions::from(config),
    ));
    let (subscription, events) = watcher.attach(&feed);
    let run = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run(events).await })
    };

    replay(&steps, &page, &models, &feed).await;
    // Dropping the subscription closes the event stream once it is drained.
    feed.unsubscribe(subscription);
    if let Err(e) = run.await {
        tracing::warn!(error = %e, "watcher task failed");
    }
    bridge_task.abort();

    if let Some(dispatcher) = dispatcher {
        dispatcher.wait_idle().await;
        return Ok(());
    }

    let records = std::mem::take(
        &mut *printed
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    );
    if records.is_empty() {
        println!("No accepted submissions in trace");
    }
    for record in &records {
        println!("{} {}", check(), record.remote_path().accent());
        println!("{}", render_file(record).muted());
    }
    Ok(())
}
