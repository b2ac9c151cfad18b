//! Editor text extraction
//!
//! Strategies are tried in priority order:
//! 1. the editor's in-memory models, via the privileged [`bridge`]
//! 2. rendered line elements (only what is on screen)
//! 3. a plain textarea
//!
//! A candidate shorter than the plausibility threshold is never returned; the
//! next strategy gets a turn instead. `None` means extraction failed, not that
//! the submission was empty.

pub mod bridge;
mod strategy;

pub use bridge::{BridgeRequest, BridgeResponse, EditorBridge, ModelSource, serve_bridge};
pub use strategy::{
    ExtractionStrategy, ModelStrategy, RenderedLinesStrategy, TextareaStrategy, select_longest,
};

use crate::page::Page;
use std::time::Duration;
use tracing::debug;

/// Default minimum length, in characters after trimming, for text to count as code
pub const MIN_CODE_LEN: usize = 5;

/// Whether `text` is long enough to be a real solution rather than a partial capture
pub fn is_plausible(text: &str, min_len: usize) -> bool {
    text.trim().chars().count() >= min_len
}

/// Reads the user's solution out of the page
pub struct EditorExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    min_len: usize,
}

impl EditorExtractor {
    /// Standard strategy order; without a bridge the model strategy is skipped
    pub fn new(bridge: Option<EditorBridge>, bridge_timeout: Duration, min_len: usize) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        if let Some(bridge) = bridge {
            strategies.push(Box::new(ModelStrategy::new(bridge, bridge_timeout)));
        }
        strategies.push(Box::new(RenderedLinesStrategy));
        strategies.push(Box::new(TextareaStrategy));
        Self::with_strategies(strategies, min_len)
    }

    /// Explicit strategy list, tried in order
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>, min_len: usize) -> Self {
        Self {
            strategies,
            min_len,
        }
    }

    /// Minimum plausible code length
    pub const fn min_len(&self) -> usize {
        self.min_len
    }

    /// Complete current editor text, or `None` if nothing plausible was found
    pub async fn extract_code(&self, page: &dyn Page) -> Option<String> {
        let html = page.html();
        for strategy in &self.strategies {
            let Some(text) = strategy.extract(&html).await else {
                debug!(strategy = strategy.name(), "strategy found nothing");
                continue;
            };
            if is_plausible(&text, self.min_len) {
                debug!(strategy = strategy.name(), len = text.len(), "extracted code");
                return Some(text);
            }
            debug!(
                strategy = strategy.name(),
                len = text.trim().len(),
                min = self.min_len,
                "rejected implausibly short code"
            );
        }
        None
    }
}
