//! Core data types shared across the pipeline

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Problem difficulty, used as the top-level directory in the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Difficulty {
    /// Easy
    Easy,
    /// Medium (also the fallback when the page doesn't say)
    #[default]
    Medium,
    /// Hard
    Hard,
}

impl Difficulty {
    /// Every difficulty, in directory bootstrap order
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Lower-cased form, used as a path segment
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Title-cased form, used for display
    pub const fn title(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Read a difficulty out of arbitrary label text, defaulting to medium
    pub fn from_label(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("easy") {
            Self::Easy
        } else if lower.contains("hard") {
            Self::Hard
        } else {
            Self::Medium
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Extension used when a language control exists but its label is unrecognized
pub const UNKNOWN_LANGUAGE: &str = "txt";

/// Extension used when no language control can be found at all
pub const DEFAULT_LANGUAGE: &str = "cpp";

// Ordered so that longer labels win: "javascript" before "java", "c++" before "c".
const LANGUAGE_LABELS: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("typescript", "ts"),
    ("python3", "py"),
    ("python", "py"),
    ("kotlin", "kt"),
    ("swift", "swift"),
    ("scala", "scala"),
    ("rust", "rs"),
    ("ruby", "rb"),
    ("java", "java"),
    ("c++", "cpp"),
    ("cpp", "cpp"),
    ("c#", "cs"),
    ("go", "go"),
    ("c", "c"),
];

/// Map a language selector label (e.g. "Python3") to a file extension
pub fn extension_for_label(label: &str) -> &'static str {
    let lower = label.trim().to_lowercase();
    let is_word = |key: &str| {
        lower
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .any(|word| word == key)
    };
    // Short keys ("c", "go", "c#") only match whole words.
    LANGUAGE_LABELS
        .iter()
        .find(|(key, _)| {
            if key.len() <= 2 {
                is_word(*key)
            } else {
                lower.contains(key)
            }
        })
        .map_or(UNKNOWN_LANGUAGE, |(_, ext)| *ext)
}

/// Strip everything that is not an ASCII letter or digit
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Problem metadata read from the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInfo {
    /// Problem identifier, opaque text
    pub number: String,
    /// Sanitized title
    pub name: String,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Raw title as displayed
    pub full_title: String,
}

/// One accepted, content-distinct submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    /// Problem identifier, opaque text
    pub number: String,
    /// Sanitized title
    pub name: String,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Raw title as displayed
    pub full_title: String,
    /// Accepted source text
    pub code: String,
    /// Short file extension, e.g. `py`
    pub language: String,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Assemble a record from page metadata and captured code
    pub fn new(problem: ProblemInfo, code: String, language: String) -> Self {
        Self {
            number: problem.number,
            name: problem.name,
            difficulty: problem.difficulty,
            full_title: problem.full_title,
            code,
            language,
            timestamp: Utc::now(),
        }
    }

    /// File name inside the difficulty directory
    pub fn filename(&self) -> String {
        format!(
            "{}-{}.{}",
            self.number,
            sanitize_name(&self.name),
            self.language
        )
    }

    /// Repository path: `{difficulty}/{number}-{name}.{language}`
    pub fn remote_path(&self) -> String {
        format!("{}/{}", self.difficulty.as_str(), self.filename())
    }

    /// Reject records that must never reach the sync engine
    pub fn validate(&self, min_code_len: usize) -> Result<()> {
        if self.number.trim().is_empty() {
            return Err(Error::InvalidRecord("missing problem number".to_string()));
        }
        if sanitize_name(&self.name).is_empty() {
            return Err(Error::InvalidRecord("missing problem name".to_string()));
        }
        if self.language.is_empty() || !self.language.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRecord(format!(
                "invalid language extension: {:?}",
                self.language
            )));
        }
        let len = self.code.trim().chars().count();
        if len < min_code_len {
            return Err(Error::InvalidRecord(format!(
                "code too short ({len} < {min_code_len} chars)"
            )));
        }
        Ok(())
    }
}

/// A GitHub repository identifier (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_end_matches('/');
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "repository must be in the form 'owner/repository', got: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RepoId> for String {
    fn from(value: RepoId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What the sync engine needs to write to GitHub
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth or personal access token
    pub token: String,
    /// Target repository
    pub repo: RepoId,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("repo", &self.repo)
            .finish()
    }
}
