//! Named ways of reading the editor's text

use super::bridge::EditorBridge;
use crate::page::{Document, Locator, element_text};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// One way of obtaining the editor text
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Try to read the editor text from `html` (or from wherever the strategy looks)
    async fn extract(&self, html: &str) -> Option<String>;
}

/// Read the in-memory document models through the privileged bridge
///
/// Authoritative: includes lines scrolled out of view. When several models
/// exist the longest one is taken, since empty placeholder instances sit
/// alongside the real one with nothing else to tell them apart.
pub struct ModelStrategy {
    bridge: EditorBridge,
    timeout: Duration,
}

impl ModelStrategy {
    /// Create a strategy that waits at most `timeout` for the bridge
    pub const fn new(bridge: EditorBridge, timeout: Duration) -> Self {
        Self { bridge, timeout }
    }
}

/// The longest of several model texts
pub fn select_longest(models: Vec<String>) -> Option<String> {
    models
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .max_by_key(|m| m.chars().count())
}

#[async_trait]
impl ExtractionStrategy for ModelStrategy {
    fn name(&self) -> &'static str {
        "editor-models"
    }

    async fn extract(&self, _html: &str) -> Option<String> {
        match self.bridge.request_models(self.timeout).await {
            Ok(models) => {
                debug!(count = models.len(), "editor bridge answered");
                select_longest(models)
            }
            Err(e) => {
                warn!(error = %e, "editor bridge unavailable, falling back");
                None
            }
        }
    }
}

const VIEW_LINES: Locator = Locator::new("view-lines", ".monaco-editor .view-line");

/// Rebuild the text from rendered editor lines
///
/// Lossy: only lines the editor has rendered are visible.
pub struct RenderedLinesStrategy;

#[async_trait]
impl ExtractionStrategy for RenderedLinesStrategy {
    fn name(&self) -> &'static str {
        "rendered-lines"
    }

    async fn extract(&self, html: &str) -> Option<String> {
        let doc = Document::parse(html);
        let lines: Vec<String> = doc
            .select_all(VIEW_LINES.selector)
            .into_iter()
            .map(element_text)
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(lines.join("\n"))
    }
}

const PLAIN_INPUT: Locator = Locator::new("plain-input", "textarea[autocomplete=\"off\"]");

/// Read a plain text input's value
pub struct TextareaStrategy;

#[async_trait]
impl ExtractionStrategy for TextareaStrategy {
    fn name(&self) -> &'static str {
        "textarea"
    }

    async fn extract(&self, html: &str) -> Option<String> {
        let doc = Document::parse(html);
        let el = doc.select_all(PLAIN_INPUT.selector).into_iter().next()?;
        Some(el.text().collect())
    }
}
