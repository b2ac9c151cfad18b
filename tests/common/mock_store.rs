//! In-memory content store for testing the sync engine

#![allow(dead_code)]

use async_trait::async_trait;
use leetsync::error::{Error, Result};
use leetsync::store::{ContentStore, PutFileRequest, PutResult, RemoteEntry, RemoteFile};
use leetsync::types::Credentials;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A failure the next matching upsert returns instead of writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Conflict,
    NotFound,
    Server,
}

/// A recorded upsert
#[derive(Debug, Clone)]
pub struct PutCall {
    pub path: String,
    pub request: PutFileRequest,
}

/// Content store that keeps files in a map and records every call
///
/// A path is a directory when any stored file lives under it. Upserts follow
/// the remote rules: replacing a file needs its current sha.
#[derive(Default)]
pub struct MockContentStore {
    files: Mutex<HashMap<String, (String, String)>>,
    lookups: Mutex<Vec<String>>,
    puts: Mutex<Vec<PutCall>>,
    failures: Mutex<VecDeque<(String, ScriptedFailure)>>,
    offline: Mutex<bool>,
    delay: Option<Duration>,
    next_sha: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upsert sleeps for `delay` before writing
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Seed a file with a known sha
    pub fn insert_file(&self, path: &str, sha: &str, text: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (sha.to_string(), text.to_string()));
    }

    /// Make the next upsert of `path` fail
    pub fn fail_next(&self, path: &str, failure: ScriptedFailure) {
        self.failures
            .lock()
            .unwrap()
            .push_back((path.to_string(), failure));
    }

    /// Fail every call with a server error while set
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(_, t)| t.clone())
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.puts.lock().unwrap().clone()
    }

    /// Upserts of `path`, in order
    pub fn puts_to(&self, path: &str) -> Vec<PutCall> {
        self.puts().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn request_count(&self) -> usize {
        self.lookups.lock().unwrap().len() + self.puts.lock().unwrap().len()
    }

    /// Most upserts that were ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn take_failure(&self, path: &str) -> Option<ScriptedFailure> {
        let mut failures = self.failures.lock().unwrap();
        let index = failures.iter().position(|(p, _)| p == path)?;
        failures.remove(index).map(|(_, f)| f)
    }

    fn is_offline(&self) -> bool {
        *self.offline.lock().unwrap()
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn lookup(&self, _creds: &Credentials, path: &str) -> Result<Option<RemoteEntry>> {
        self.lookups.lock().unwrap().push(path.to_string());
        if self.is_offline() {
            return Err(Error::GitHubApi("service unavailable".to_string()));
        }
        let files = self.files.lock().unwrap();
        if let Some((sha, _)) = files.get(path) {
            return Ok(Some(RemoteEntry::File(RemoteFile {
                path: path.to_string(),
                sha: sha.clone(),
            })));
        }
        let prefix = format!("{path}/");
        Ok(files
            .keys()
            .any(|p| p.starts_with(&prefix))
            .then_some(RemoteEntry::Directory))
    }

    async fn put_file(
        &self,
        _creds: &Credentials,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<PutResult> {
        self.puts.lock().unwrap().push(PutCall {
            path: path.to_string(),
            request: request.clone(),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.write(path, request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockContentStore {
    fn write(&self, path: &str, request: &PutFileRequest) -> Result<PutResult> {
        if self.is_offline() {
            return Err(Error::GitHubApi("service unavailable".to_string()));
        }
        match self.take_failure(path) {
            Some(ScriptedFailure::Conflict) => {
                return Err(Error::Conflict {
                    path: path.to_string(),
                });
            }
            Some(ScriptedFailure::NotFound) => {
                return Err(Error::NotFound {
                    path: path.to_string(),
                });
            }
            Some(ScriptedFailure::Server) => {
                return Err(Error::GitHubApi("internal server error".to_string()));
            }
            None => {}
        }

        let mut files = self.files.lock().unwrap();
        let current = files.get(path).map(|(sha, _)| sha.clone());
        if current != request.sha {
            return Err(Error::Conflict {
                path: path.to_string(),
            });
        }
        let sha = format!("sha{}", self.next_sha.fetch_add(1, Ordering::SeqCst));
        let text = request.text().unwrap_or_default();
        files.insert(path.to_string(), (sha.clone(), text));
        Ok(PutResult {
            created: current.is_none(),
            sha: Some(sha),
        })
    }
}
