//! Repository identifiers from user input

use crate::error::{Error, Result};
use crate::types::RepoId;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for SSH URLs: git@host:owner/repo.git
static RE_SSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git@[^:]+:(.+?)(?:\.git)?$").unwrap());

/// Regex for HTTPS URLs: `https://host/owner/repo.git`
static RE_HTTPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^/]+/(.+?)(?:\.git)?$").unwrap());

/// Parse `owner/repo`, or a clone/browse URL pointing at one
pub fn parse_repo_id(input: &str) -> Result<RepoId> {
    // Normalize: strip whitespace and trailing slashes
    let input = input.trim().trim_end_matches('/');
    if input.is_empty() {
        return Err(Error::Config("repository is empty".to_string()));
    }

    let path = RE_SSH
        .captures(input)
        .or_else(|| RE_HTTPS.captures(input))
        .and_then(|c| c.get(1))
        .map_or(input, |m| m.as_str());

    let decoded = urlencoding::decode(path)
        .map_err(|e| Error::Parse(format!("invalid URL encoding in repository: {e}")))?;
    decoded.parse()
}
