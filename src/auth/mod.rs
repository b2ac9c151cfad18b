//! GitHub authentication
//!
//! Tokens come from local state (set by the OAuth flow or `auth login`), the
//! environment, or the gh CLI, in that order.

mod github;
mod oauth;

pub use github::{
    GitHubAuthConfig, RepoSummary, fetch_username, get_github_auth, list_repositories,
};
pub use oauth::{TokenExchange, authorize_url, exchange_code};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token saved in local state
    Stored,
    /// Token from environment variable
    EnvVar,
    /// Token from the gh CLI
    Cli,
}

impl std::fmt::Display for AuthSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored => write!(f, "saved login"),
            Self::EnvVar => write!(f, "environment"),
            Self::Cli => write!(f, "gh CLI"),
        }
    }
}
