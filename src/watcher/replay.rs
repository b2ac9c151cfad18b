//! Recorded page sessions
//!
//! A trace is JSON Lines, one [`TraceStep`] per line. Each step may update
//! the page (URL, HTML, live editor models) and then publish an event, at a
//! millisecond offset from the start of the replay. Blank lines and lines
//! starting with `#` are skipped.

use crate::editor::ModelSource;
use crate::error::{Error, Result};
use crate::page::{ChangeFeed, PageEvent, SnapshotPage};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One step of a recorded session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Offset from the start of the replay
    #[serde(default)]
    pub at_ms: u64,
    /// New page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// New page HTML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// New editor model texts, as the privileged side would report them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    /// Event to publish after applying the updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<PageEvent>,
}

/// Parse a JSON Lines trace
pub fn parse_trace(text: &str) -> Result<Vec<TraceStep>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::Parse(format!("trace line {}: {e}", i + 1)))
        })
        .collect()
}

/// Editor models that a trace can swap out
#[derive(Debug, Default)]
pub struct TraceModels(RwLock<Vec<String>>);

impl TraceModels {
    /// Replace the current models
    pub fn set(&self, models: Vec<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = models;
    }
}

impl ModelSource for TraceModels {
    fn models(&self) -> Vec<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Play `steps` against `page`, `models` and `feed` in real (or paused) time
pub async fn replay(steps: &[TraceStep], page: &SnapshotPage, models: &TraceModels, feed: &ChangeFeed) {
    let start = Instant::now();
    for (i, step) in steps.iter().enumerate() {
        tokio::time::sleep_until(start + Duration::from_millis(step.at_ms)).await;
        if let Some(url) = &step.url {
            page.set_url(url.as_str());
        }
        if let Some(html) = &step.html {
            page.set_html(html.as_str());
        }
        if let Some(texts) = &step.models {
            models.set(texts.clone());
        }
        if let Some(event) = &step.event {
            let delivered = feed.publish(event);
            debug!(step = i, delivered, "replayed event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_trace_skips_comments() {
        let steps = parse_trace(
            r#"
# submit, then accepted
{"at_ms": 0, "event": {"kind": "click", "target": "<button>Submit</button>"}}

{"at_ms": 1500, "event": {"kind": "mutation", "added": ["<div>Accepted</div>"]}}
"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].at_ms, 1500);
        assert!(matches!(steps[0].event, Some(PageEvent::Click { .. })));
    }

    #[test]
    fn test_parse_trace_reports_line() {
        let err = parse_trace("{}\nnot json").unwrap_err();
        assert!(err.to_string().contains("trace line 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_applies_updates_in_order() {
        let page = SnapshotPage::new("https://leetcode.com/problems/two-sum/", "");
        let models = TraceModels::default();
        let feed = ChangeFeed::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        feed.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let steps = vec![
            TraceStep {
                html: Some("<p>one</p>".to_string()),
                models: Some(vec!["print(1)".to_string()]),
                ..TraceStep::default()
            },
            TraceStep {
                at_ms: 2000,
                url: Some("https://leetcode.com/problems/3sum/".to_string()),
                event: Some(PageEvent::Navigated {
                    url: "https://leetcode.com/problems/3sum/".to_string(),
                }),
                ..TraceStep::default()
            },
        ];
        replay(&steps, &page, &models, &feed).await;

        assert_eq!(page.url(), "https://leetcode.com/problems/3sum/");
        assert_eq!(page.html(), "<p>one</p>");
        assert_eq!(models.models(), vec!["print(1)"]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
