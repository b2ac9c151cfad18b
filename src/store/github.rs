//! GitHub contents API

use crate::error::{Error, Result};
use crate::store::{ContentStore, PutFileRequest, PutResult, RemoteEntry, RemoteFile};
use crate::types::{Credentials, RepoId};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Default timeout for API requests (30 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitHub rejects requests without a user agent
pub const USER_AGENT: &str = concat!("leetsync/", env!("CARGO_PKG_VERSION"));

const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Deserialize)]
struct FileResponse {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: Option<FileResponse>,
}

/// Contents API client; credentials are supplied per call
pub struct GitHubContentStore {
    client: Client,
    api_base: String,
}

impl GitHubContentStore {
    /// Create a client for the API rooted at `api_base`
    pub fn new(api_base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// API root in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn contents_url(&self, repo: &RepoId, path: &str) -> String {
        let path = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path
        )
    }

    fn auth_header(token: &str) -> String {
        format!("Bearer {token}")
    }
}

/// The API's `message` field, or the bare status
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body: Option<Value> = response.json().await.ok();
    body.as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| status.to_string(), |m| format!("{status}: {m}"))
}

/// Map a failed response onto the crate error taxonomy
async fn failure(response: Response, path: &str) -> Error {
    let status = response.status();
    let message = error_message(response).await;
    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Error::Conflict {
            path: path.to_string(),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        _ => Error::GitHubApi(message),
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn lookup(&self, creds: &Credentials, path: &str) -> Result<Option<RemoteEntry>> {
        let url = self.contents_url(&creds.repo, path);
        debug!(repo = %creds.repo, path, "looking up remote path");

        let response = self
            .client
            .get(&url)
            .header("Authorization", Self::auth_header(&creds.token))
            .header("Accept", ACCEPT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "remote path absent");
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
                _ => Error::GitHubApi(message),
            });
        }

        let body: Value = response.json().await?;
        if body.is_array() {
            debug!(path, "remote path is a directory");
            return Ok(Some(RemoteEntry::Directory));
        }
        let file: FileResponse = serde_json::from_value(body)
            .map_err(|e| Error::GitHubApi(format!("unexpected contents response for {path}: {e}")))?;
        debug!(path, sha = %file.sha, "remote file found");
        Ok(Some(RemoteEntry::File(RemoteFile {
            path: file.path,
            sha: file.sha,
        })))
    }

    async fn put_file(
        &self,
        creds: &Credentials,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<PutResult> {
        let url = self.contents_url(&creds.repo, path);
        debug!(
            repo = %creds.repo,
            path,
            has_sha = request.sha.is_some(),
            branch = %request.branch,
            "writing remote file"
        );

        let response = self
            .client
            .put(&url)
            .header("Authorization", Self::auth_header(&creds.token))
            .header("Accept", ACCEPT)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = failure(response, path).await;
            debug!(path, %status, error = %err, "remote write failed");
            return Err(err);
        }

        let created = status == StatusCode::CREATED;
        let sha = response
            .json::<PutResponse>()
            .await
            .ok()
            .and_then(|r| r.content)
            .map(|c| c.sha);
        debug!(path, created, sha = ?sha, "remote file written");
        Ok(PutResult { created, sha })
    }
}
