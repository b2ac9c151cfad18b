//! CLI commands

mod auth;
mod host;
mod notify;
mod pending;
mod replay;
mod repo;
mod status;
pub mod style;
mod sync;

pub use auth::{AuthAction, run_auth};
pub use host::{run_host, run_serve};
pub use notify::CliNotifier;
pub use pending::{PendingAction, run_pending};
pub use replay::run_replay;
pub use repo::run_repo;
pub use status::run_status;
pub use sync::{SyncOptions, run_sync};

use leetsync::config::Config;
use leetsync::error::Result;
use leetsync::storage::{JsonFileStore, LocalState};
use leetsync::sync::SyncEngine;
use std::sync::Arc;

/// Local state at the configured path
pub fn open_state(config: &Config) -> LocalState {
    LocalState::new(Arc::new(JsonFileStore::open(&config.state_path)))
}

/// Engine that reports to the terminal
pub fn cli_engine(config: &Config) -> Result<SyncEngine> {
    Ok(SyncEngine::from_config(config)?.with_notifier(Arc::new(CliNotifier)))
}
