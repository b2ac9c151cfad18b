//! OAuth web flow: authorize redirect and code exchange

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::store::github::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Scope requested from GitHub; contents writes need `repo`
pub const OAUTH_SCOPE: &str = "repo";

/// Token endpoint reply; GitHub answers 200 even when the exchange fails
#[derive(Debug, Deserialize)]
pub struct TokenExchange {
    /// Issued token
    pub access_token: Option<String>,
    /// Machine-readable failure
    pub error: Option<String>,
    /// Human-readable failure
    pub error_description: Option<String>,
}

fn client_id(config: &RelayConfig) -> Result<&str> {
    config
        .client_id
        .as_deref()
        .ok_or_else(|| Error::Config("GITHUB_CLIENT_ID is not set".to_string()))
}

/// URL the user is sent to for authorization
pub fn authorize_url(config: &RelayConfig) -> Result<String> {
    let client_id = client_id(config)?;
    let base = format!(
        "{}/login/oauth/authorize",
        config.oauth_base.trim_end_matches('/')
    );
    let mut url = Url::parse(&base)
        .map_err(|e| Error::Config(format!("invalid OAuth base URL {base}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", OAUTH_SCOPE);
    Ok(url.into())
}

/// Trade an authorization code for an access token
pub async fn exchange_code(config: &RelayConfig, code: &str) -> Result<String> {
    let client_id = client_id(config)?;
    let client_secret = config
        .client_secret
        .as_deref()
        .ok_or_else(|| Error::Config("GITHUB_CLIENT_SECRET is not set".to_string()))?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

    let url = format!(
        "{}/login/oauth/access_token",
        config.oauth_base.trim_end_matches('/')
    );
    debug!(%url, "exchanging authorization code");
    let reply: TokenExchange = client
        .post(&url)
        .header("Accept", "application/json")
        .json(&serde_json::json!({
            "client_id": client_id,
            "client_secret": client_secret,
            "code": code,
            "redirect_uri": config.redirect_uri,
        }))
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::Auth(format!("token exchange failed: {e}")))?
        .json()
        .await?;

    match reply.access_token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(token),
        None => Err(Error::Auth(format!(
            "Failed to obtain access token: {}",
            reply
                .error_description
                .or(reply.error)
                .unwrap_or_else(|| "no token in response".to_string())
        ))),
    }
}
