//! Submission watcher
//!
//! Turns page events into at most one [`SubmissionRecord`] per accepted,
//! content-distinct submission:
//! - a submit click stages a snapshot of code, language and problem right away,
//!   because the judge may re-render the editor while grading
//! - an "Accepted" verdict, after a settle delay, assembles the record from the
//!   staged snapshot (or a live re-read), fingerprints it and dispatches it
//!   unless it matches the last dispatched one
//! - a URL change re-arms everything; the judge is a single-page app, so this is
//!   detected from events and by polling rather than from page loads

pub mod detect;
mod fingerprint;
pub mod replay;
mod state;

pub use detect::{Verdict, classify_verdict, is_submit_click};
pub use fingerprint::{FINGERPRINT_LEN, fingerprint};
pub use state::{StagedSnapshot, WatcherMachine, WatcherState};

use crate::config::Config;
use crate::editor::{EditorExtractor, is_plausible};
use crate::page::problem::{detect_language, read_problem};
use crate::page::{ChangeFeed, Document, Page, PageEvent, SubscriptionId};
use crate::types::{ProblemInfo, SubmissionRecord};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Receives finished records
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Hand over one accepted, non-duplicate record
    async fn dispatch(&self, record: SubmissionRecord);
}

/// Timing and threshold knobs
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Wait after the verdict appears before reading final state
    pub settle_delay: Duration,
    /// How often to compare the page URL against the armed one
    pub url_poll_interval: Duration,
    /// Maximum age of a staged snapshot
    pub staging_ttl: Duration,
    /// Minimum plausible code length
    pub min_code_len: usize,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WatcherOptions {
    fn from(config: &Config) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            url_poll_interval: Duration::from_millis(config.url_poll_interval_ms),
            staging_ttl: Duration::from_secs(config.staging_ttl_secs),
            min_code_len: config.min_code_len,
        }
    }
}

/// Watches one page for accepted submissions
pub struct SubmissionWatcher {
    page: Arc<dyn Page>,
    extractor: Arc<EditorExtractor>,
    sink: Arc<dyn SubmissionSink>,
    machine: Arc<Mutex<WatcherMachine>>,
    options: WatcherOptions,
}

/// Problem metadata and language read from a document
fn read_metadata(html: &str) -> (Option<ProblemInfo>, String) {
    let doc = Document::parse(html);
    (read_problem(&doc), detect_language(&doc))
}

impl SubmissionWatcher {
    /// Create a watcher armed for the page's current URL
    pub fn new(
        page: Arc<dyn Page>,
        extractor: Arc<EditorExtractor>,
        sink: Arc<dyn SubmissionSink>,
        options: WatcherOptions,
    ) -> Self {
        let machine = WatcherMachine::new(page.url(), options.staging_ttl);
        Self {
            page,
            extractor,
            sink,
            machine: Arc::new(Mutex::new(machine)),
            options,
        }
    }

    /// Current state
    pub fn state(&self) -> WatcherState {
        self.lock().state()
    }

    /// Shared handle on the state machine
    pub fn machine(&self) -> Arc<Mutex<WatcherMachine>> {
        Arc::clone(&self.machine)
    }

    fn lock(&self) -> MutexGuard<'_, WatcherMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `feed`; events queue up until [`run`](Self::run) drains them
    pub fn attach(&self, feed: &ChangeFeed) -> (SubscriptionId, mpsc::UnboundedReceiver<PageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = feed.subscribe(move |event| {
            // The receiver is gone once the watcher stops; nothing to do then.
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Process events and poll the URL until the event stream closes
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<PageEvent>) {
        let mut poll = tokio::time::interval(self.options.url_poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = poll.tick() => {
                    self.check_url();
                }
            }
        }
        debug!("page event stream closed, watcher stopped");
    }

    /// Handle one page event
    pub async fn handle_event(&self, event: PageEvent) {
        match event {
            PageEvent::Click { target } => {
                if is_submit_click(&target) {
                    self.on_submit_click().await;
                }
            }
            PageEvent::Mutation { added } => self.on_mutation(&added).await,
            PageEvent::Navigated { url } => {
                self.lock().navigate(&url);
            }
        }
    }

    /// Re-arm if the page URL moved; returns true if it did
    pub fn check_url(&self) -> bool {
        let url = self.page.url();
        let changed = self.lock().navigate(&url);
        if changed {
            info!(%url, "now watching new problem");
        }
        changed
    }

    async fn on_submit_click(&self) {
        let code = self.extractor.extract_code(self.page.as_ref()).await;
        let (problem, language) = read_metadata(&self.page.html());
        debug!(
            has_code = code.is_some(),
            has_problem = problem.is_some(),
            %language,
            "submit clicked, staging snapshot"
        );
        let snapshot = StagedSnapshot {
            code,
            language,
            problem,
            url: self.page.url(),
            captured_at: Instant::now(),
        };
        self.lock().on_submit_click(snapshot);
    }

    async fn on_mutation(&self, added: &[String]) {
        if self.state() != WatcherState::AwaitingVerdict {
            return;
        }
        match added.iter().find_map(|html| classify_verdict(html)) {
            Some(Verdict::Accepted) => {
                let started = self.lock().begin_processing();
                if !started {
                    return;
                }
                info!("accepted verdict observed");
                tokio::time::sleep(self.options.settle_delay).await;
                if self.check_url() {
                    warn!("page changed while settling, dropping submission");
                    return;
                }
                self.process().await;
            }
            Some(Verdict::Rejected(verdict)) => {
                info!(%verdict, "submission not accepted");
                self.lock().on_rejected();
            }
            None => {}
        }
    }

    async fn process(&self) {
        let staged = self.lock().take_staged(Instant::now());
        let Some(record) = self.assemble(staged).await else {
            self.lock().finish();
            return;
        };

        let fp = fingerprint(&record.code);
        let duplicate = {
            let mut machine = self.lock();
            let duplicate = machine.is_duplicate(&fp);
            if !duplicate {
                machine.mark_dispatched(fp.clone());
            }
            machine.finish();
            duplicate
        };
        if duplicate {
            debug!(fingerprint = %fp, "same code as last dispatch, skipping");
            return;
        }

        info!(path = %record.remote_path(), fingerprint = %fp, "dispatching accepted submission");
        self.sink.dispatch(record).await;
    }

    async fn assemble(&self, staged: Option<StagedSnapshot>) -> Option<SubmissionRecord> {
        let min_len = self.options.min_code_len;
        let (staged_code, staged_problem, staged_language) = match staged {
            Some(s) => (s.code, s.problem, Some(s.language)),
            None => (None, None, None),
        };

        let code = match staged_code.filter(|c| is_plausible(c, min_len)) {
            Some(code) => code,
            None => {
                debug!("no usable staged code, re-extracting");
                let Some(code) = self.extractor.extract_code(self.page.as_ref()).await else {
                    warn!("could not read solution code, skipping submission");
                    return None;
                };
                code
            }
        };

        let (live_problem, live_language) = if staged_problem.is_some() && staged_language.is_some() {
            (None, None)
        } else {
            let (problem, language) = read_metadata(&self.page.html());
            (problem, Some(language))
        };
        let Some(problem) = staged_problem.or(live_problem) else {
            warn!("could not read problem metadata, skipping submission");
            return None;
        };
        let language = staged_language.or(live_language).unwrap_or_default();

        let record = SubmissionRecord::new(problem, code, language);
        if let Err(e) = record.validate(min_len) {
            warn!(error = %e, "malformed submission, skipping");
            return None;
        }
        Some(record)
    }
}
