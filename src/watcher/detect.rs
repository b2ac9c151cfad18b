//! Recognizing the submit click and the judge's verdict

use crate::page::{Document, Locator, element_text};

/// The judge's submit control
pub const SUBMIT_LOCATORS: &[Locator] = &[Locator::new(
    "submit-button",
    "[data-e2e-locator=\"console-submit-button\"]",
)];

/// The judge's verdict banner
pub const VERDICT_LOCATORS: &[Locator] = &[Locator::new(
    "submission-result",
    "[data-e2e-locator=\"submission-result\"]",
)];

/// Text that marks a passing verdict
pub const ACCEPTED_MARKER: &str = "Accepted";

/// Verdicts that must never count as accepted, even next to the word "Accepted"
pub const REJECTED_MARKERS: &[&str] = &[
    "Wrong Answer",
    "Runtime Error",
    "Time Limit Exceeded",
    "Memory Limit Exceeded",
    "Output Limit Exceeded",
    "Compile Error",
];

/// What a verdict banner said
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All tests passed
    Accepted,
    /// Any failing verdict
    Rejected(String),
}

/// Whether a click target is (or sits inside) the submit control
pub fn is_submit_click(target_html: &str) -> bool {
    let doc = Document::fragment(target_html);
    if doc.matches_any(SUBMIT_LOCATORS) {
        return true;
    }
    // The target may be the button or only its label span.
    if doc.text().trim().eq_ignore_ascii_case("submit") {
        return true;
    }
    doc.select_all("button")
        .into_iter()
        .any(|button| element_text(button).trim().eq_ignore_ascii_case("submit"))
}

fn classify_text(text: &str) -> Option<Verdict> {
    if let Some(rejected) = REJECTED_MARKERS.iter().find(|m| text.contains(*m)) {
        return Some(Verdict::Rejected((*rejected).to_string()));
    }
    text.contains(ACCEPTED_MARKER).then_some(Verdict::Accepted)
}

/// Classify an added subtree; `None` when it carries no verdict at all
pub fn classify_verdict(added_html: &str) -> Option<Verdict> {
    let doc = Document::fragment(added_html);
    if let Some(text) = doc.first_text(VERDICT_LOCATORS) {
        return classify_text(&text);
    }
    classify_text(&doc.text())
}
