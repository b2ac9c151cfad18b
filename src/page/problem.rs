//! Problem metadata reader
//!
//! Title, difficulty and language are each found through an ordered list of
//! locators; the first one that matches wins. Missing difficulty or language
//! falls back to a default, a missing title means there is no problem.

use super::{Document, Locator};
use crate::types::{
    DEFAULT_LANGUAGE, Difficulty, ProblemInfo, extension_for_label, sanitize_name,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Problem title, e.g. "1. Two Sum"
pub const TITLE_LOCATORS: &[Locator] = &[
    Locator::new("question-title", "[data-cy=\"question-title\"]"),
    Locator::new("title-large", ".text-title-large"),
];

/// Difficulty badge
pub const DIFFICULTY_LOCATORS: &[Locator] = &[
    Locator::new("diff-attribute", "[diff]"),
    Locator::new(
        "difficulty-class",
        ".text-difficulty-easy, .text-difficulty-medium, .text-difficulty-hard",
    ),
];

/// Editor language picker
pub const LANGUAGE_LOCATORS: &[Locator] = &[
    Locator::new("listbox-button", "[id*=\"headlessui-listbox-button\"]"),
    Locator::new("language-pill", ".rounded-lg.px-3"),
];

/// Regex for numbered titles: "123. Some Title"
static RE_NUMBERED_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^.\s]+)\s*\.\s*(.+?)\s*$").unwrap());

/// Split a raw title into (number, name); unnumbered titles use the whole text for both
pub fn split_title(title: &str) -> (String, String) {
    RE_NUMBERED_TITLE.captures(title).map_or_else(
        || (title.trim().to_string(), title.trim().to_string()),
        |caps| (caps[1].to_string(), caps[2].to_string()),
    )
}

/// Read title, number and difficulty from the document
pub fn read_problem(doc: &Document) -> Option<ProblemInfo> {
    let Some(full_title) = doc.first_text(TITLE_LOCATORS) else {
        debug!("no problem title on page");
        return None;
    };
    let (number, name) = split_title(&full_title);

    let difficulty = doc
        .first_text(DIFFICULTY_LOCATORS)
        .map_or_else(Difficulty::default, |text| Difficulty::from_label(&text));

    Some(ProblemInfo {
        number,
        name: sanitize_name(&name),
        difficulty,
        full_title,
    })
}

/// File extension for the language currently selected in the editor
pub fn detect_language(doc: &Document) -> String {
    doc.first_text(LANGUAGE_LOCATORS).map_or_else(
        || {
            debug!("no language picker on page, using default");
            DEFAULT_LANGUAGE.to_string()
        },
        |label| extension_for_label(&label).to_string(),
    )
}
