//! Remote content store
//!
//! The repository is addressed by path. There is no directory primitive:
//! directories exist only because files live under them. Updating a file
//! needs its current revision token (`sha`); a stale or missing token makes
//! the write fail instead of overwriting.

mod detection;
mod factory;
pub mod github;

pub use detection::parse_repo_id;
pub use factory::create_content_store;
pub use github::GitHubContentStore;

use crate::error::Result;
use crate::types::Credentials;
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

/// A file as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Repository-relative path
    pub path: String,
    /// Revision token
    pub sha: String,
}

/// What exists at a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    /// A single file
    File(RemoteFile),
    /// A directory listing
    Directory,
}

impl RemoteEntry {
    /// Revision token, for files
    pub fn sha(&self) -> Option<&str> {
        match self {
            Self::File(file) => Some(&file.sha),
            Self::Directory => None,
        }
    }
}

/// Body of an upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    /// Commit message
    pub message: String,
    /// Base64 of the UTF-8 file text
    pub content: String,
    /// Revision token of the file being replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Target branch
    pub branch: String,
}

impl PutFileRequest {
    /// Build a request, encoding `text`
    pub fn new(
        message: impl Into<String>,
        text: &str,
        sha: Option<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            content: base64::engine::general_purpose::STANDARD.encode(text.as_bytes()),
            sha,
            branch: branch.into(),
        }
    }

    /// Decoded file text, if `content` is valid base64 of UTF-8
    pub fn text(&self) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.content)
            .ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// True if the file did not exist before
    pub created: bool,
    /// New revision token, when reported
    pub sha: Option<String>,
}

/// Path-addressed file store with optimistic concurrency
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// What exists at `path`; `None` if nothing does
    async fn lookup(&self, creds: &Credentials, path: &str) -> Result<Option<RemoteEntry>>;

    /// Create or replace the file at `path`
    ///
    /// Fails with [`Error::Conflict`](crate::error::Error::Conflict) when the
    /// revision token is stale or missing for an existing file, and with
    /// [`Error::NotFound`](crate::error::Error::NotFound) when the store
    /// reports the target as missing.
    async fn put_file(
        &self,
        creds: &Credentials,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<PutResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_request_encodes_and_omits_missing_sha() {
        let request = PutFileRequest::new("Create easy folder", "héllo", None, "main");
        assert_eq!(request.content, "aMOpbGxv");
        assert_eq!(request.text().as_deref(), Some("héllo"));

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("sha").is_none());
        assert_eq!(body["branch"], "main");
    }

    #[test]
    fn test_put_request_includes_sha() {
        let request = PutFileRequest::new("update", "x", Some("abc".to_string()), "main");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["sha"], "abc");
    }

    #[test]
    fn test_entry_sha() {
        let file = RemoteEntry::File(RemoteFile {
            path: "easy/README.md".to_string(),
            sha: "abc".to_string(),
        });
        assert_eq!(file.sha(), Some("abc"));
        assert_eq!(RemoteEntry::Directory.sha(), None);
    }
}
