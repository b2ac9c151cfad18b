//! Provenance header embedded at the top of each synced file
//!
//! The contents API has no metadata fields, so title, difficulty and capture
//! date travel inside the file as a comment block in the file's own syntax.

use crate::types::SubmissionRecord;

/// Opening and closing comment delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStyle {
    /// First line of the block
    pub start: &'static str,
    /// Last line of the block
    pub end: &'static str,
    /// Whether the closing delimiter lines up with the ` * ` body lines
    ///
    /// Ruby only recognizes `=end` at the start of a line.
    pub indent_end: bool,
}

const C_BLOCK: CommentStyle = CommentStyle {
    start: "/*",
    end: "*/",
    indent_end: true,
};

const PY_DOCSTRING: CommentStyle = CommentStyle {
    start: "\"\"\"",
    end: "\"\"\"",
    indent_end: true,
};

const RUBY_BLOCK: CommentStyle = CommentStyle {
    start: "=begin",
    end: "=end",
    indent_end: false,
};

/// Comment syntax for a file extension; C-style for anything unlisted
pub fn comment_style(extension: &str) -> CommentStyle {
    match extension {
        "py" => PY_DOCSTRING,
        "rb" => RUBY_BLOCK,
        _ => C_BLOCK,
    }
}

/// Header block for `record`, followed by a blank line
pub fn render_header(record: &SubmissionRecord) -> String {
    let style = comment_style(&record.language);
    format!(
        "{start}\n * Problem: {title}\n * Difficulty: {difficulty}\n * Date: {date}\n{indent}{end}\n\n",
        start = style.start,
        indent = if style.indent_end { " " } else { "" },
        title = record.full_title,
        difficulty = record.difficulty.title(),
        date = record.timestamp.format("%Y-%m-%d"),
        end = style.end,
    )
}

/// Full file text: header then the code exactly as captured
pub fn render_file(record: &SubmissionRecord) -> String {
    let mut text = render_header(record);
    text.push_str(&record.code);
    text
}
