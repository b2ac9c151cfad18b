//! Parsed HTML snapshots and named selector fallbacks

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One way of finding an element, tried in order with its siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    /// Name used in logs
    pub name: &'static str,
    /// CSS selector
    pub selector: &'static str,
}

impl Locator {
    /// Create a named locator
    pub const fn new(name: &'static str, selector: &'static str) -> Self {
        Self { name, selector }
    }
}

/// A parsed document or fragment
///
/// Not `Send`: parse, read and drop within one synchronous block.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a whole document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parse a fragment such as an added subtree or click target
    pub fn fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn select_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        let Ok(parsed) = Selector::parse(selector) else {
            debug!(selector, "invalid selector");
            return Vec::new();
        };
        self.html.select(&parsed).collect()
    }

    /// First element matched by any locator, with the locator that found it
    pub fn first_match(&self, locators: &[Locator]) -> Option<(Locator, ElementRef<'_>)> {
        locators.iter().find_map(|locator| {
            let found = self.select_all(locator.selector).into_iter().next()?;
            debug!(locator = locator.name, "locator matched");
            Some((*locator, found))
        })
    }

    /// Trimmed text of the first element matched by any locator
    pub fn first_text(&self, locators: &[Locator]) -> Option<String> {
        self.first_match(locators)
            .map(|(_, el)| element_text(el).trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Whether any locator matches
    pub fn matches_any(&self, locators: &[Locator]) -> bool {
        self.first_match(locators).is_some()
    }

    /// All text in the document
    pub fn text(&self) -> String {
        element_text(self.html.root_element())
    }
}

/// Concatenated text of an element, with non-breaking spaces normalized
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().replace('\u{a0}', " ")
}
