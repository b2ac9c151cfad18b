//! Configuration file and environment overrides
//!
//! Read from `<config dir>/leetsync/config.toml` unless a path is given. Every
//! field has a default, so a missing file is not an error.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// GitHub REST API root
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub web root, used for OAuth
pub const DEFAULT_OAUTH_BASE: &str = "https://github.com";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub REST API root
    pub api_base: String,
    /// Branch commits are written to
    pub branch: String,
    /// Local key-value store file
    pub state_path: PathBuf,
    /// Wait after the verdict before reading page state
    pub settle_delay_ms: u64,
    /// How long to wait for the privileged editor bridge
    pub bridge_timeout_ms: u64,
    /// Minimum plausible code length
    pub min_code_len: usize,
    /// How often to poll the page URL
    pub url_poll_interval_ms: u64,
    /// Maximum age of a staged snapshot
    pub staging_ttl_secs: u64,
    /// OAuth relay server settings
    pub relay: RelayConfig,
}

/// OAuth relay server settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// OAuth app client id
    pub client_id: Option<String>,
    /// OAuth app client secret
    pub client_secret: Option<String>,
    /// Where GitHub sends the user back to
    pub redirect_uri: String,
    /// Listen port
    pub port: u16,
    /// GitHub web root for the authorize and token endpoints
    pub oauth_base: String,
    /// Origin the callback page may post the token to; `*` allows any opener
    pub opener_origin: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("port", &self.port)
            .field("oauth_base", &self.oauth_base)
            .field("opener_origin", &self.opener_origin)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            port: 3000,
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
            opener_origin: "*".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            branch: "main".to_string(),
            state_path: default_state_path(),
            settle_delay_ms: 1500,
            bridge_timeout_ms: 1000,
            min_code_len: crate::editor::MIN_CODE_LEN,
            url_poll_interval_ms: 1000,
            staging_ttl_secs: 600,
            relay: RelayConfig::default(),
        }
    }
}

/// `<config dir>/leetsync/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("leetsync").join("config.toml"))
}

/// `<data dir>/leetsync/state.json`, or the working directory if there is no data dir
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leetsync")
        .join("state.json")
}

impl Config {
    /// Load from `path` (or the default location), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let mut config = match path {
            Some(ref p) if p.exists() => {
                debug!(path = %p.display(), "loading config");
                let text = std::fs::read_to_string(p)?;
                Self::from_toml(&text)?
            }
            _ => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("LEETSYNC_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("LEETSYNC_BRANCH") {
            self.branch = v;
        }
        if let Some(v) = lookup("LEETSYNC_STATE") {
            self.state_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GITHUB_CLIENT_ID") {
            self.relay.client_id = Some(v);
        }
        if let Some(v) = lookup("GITHUB_CLIENT_SECRET") {
            self.relay.client_secret = Some(v);
        }
        if let Some(v) = lookup("REDIRECT_URI") {
            self.relay.redirect_uri = v;
        }
        if let Some(v) = lookup("OPENER_ORIGIN") {
            self.relay.opener_origin = v;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.relay.port = port;
        }
    }
}
