//! GitHub token lookup and verification

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use crate::storage::LocalState;
use crate::store::github::USER_AGENT;
use octocrab::Octocrab;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// Default timeout for API requests (30 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Repositories fetched per listing, newest activity first
const REPO_PAGE_SIZE: u8 = 100;

/// GitHub authentication configuration
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// Access token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("token", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// A repository the token can write to, as shown in a picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    /// Short name
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Whether the repository is private
    pub private: bool,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

fn env_token(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Get GitHub authentication
///
/// Priority:
/// 1. Token saved in local state
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
/// 4. gh CLI (`gh auth token`)
pub async fn get_github_auth(state: &LocalState) -> Result<GitHubAuthConfig> {
    debug!("checking saved token");
    if let Some(token) = state.token().await? {
        debug!("obtained GitHub token from local state");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Stored,
        });
    }

    for name in ["GITHUB_TOKEN", "GH_TOKEN"] {
        debug!(var = name, "checking env var");
        if let Some(token) = env_token(name) {
            debug!(var = name, "obtained GitHub token from env var");
            return Ok(GitHubAuthConfig {
                token,
                source: AuthSource::EnvVar,
            });
        }
    }

    debug!("attempting to get GitHub token via gh CLI");
    if let Some(token) = get_gh_cli_token().await {
        debug!("obtained GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    debug!("no GitHub authentication found");
    Err(Error::Auth(
        "No GitHub authentication found. Run `leetsync auth login`, or set GITHUB_TOKEN".to_string(),
    ))
}

async fn get_gh_cli_token() -> Option<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Login of the token's owner; `Error::Auth` if the token is rejected
pub async fn fetch_username(api_base: &str, token: &str) -> Result<String> {
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

    let url = format!("{}/user", api_base.trim_end_matches('/'));
    debug!(%url, "verifying token");
    let user: UserResponse = client
        .get(&url)
        .header("Authorization", format!("Bearer {token}"))
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::Auth(format!("Invalid token: {e}")))?
        .json()
        .await?;

    debug!(username = %user.login, "token verified");
    Ok(user.login)
}

/// Repositories visible to the token, most recently updated first
pub async fn list_repositories(api_base: &str, token: &str) -> Result<Vec<RepoSummary>> {
    let client = Octocrab::builder()
        .personal_token(token.to_string())
        .base_uri(api_base)
        .map_err(|e| Error::GitHubApi(e.to_string()))?
        .build()
        .map_err(|e| Error::GitHubApi(e.to_string()))?;

    debug!("listing repositories");
    let page = client
        .current()
        .list_repos_for_authenticated_user()
        .sort("updated")
        .per_page(REPO_PAGE_SIZE)
        .send()
        .await?;

    let repos: Vec<RepoSummary> = page
        .items
        .into_iter()
        .map(|repo| RepoSummary {
            full_name: repo.full_name.unwrap_or_else(|| repo.name.clone()),
            name: repo.name,
            private: repo.private.unwrap_or(false),
        })
        .collect();
    debug!(count = repos.len(), "listed repositories");
    Ok(repos)
}
