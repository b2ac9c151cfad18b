//! Content store factory

use crate::config::Config;
use crate::error::Result;
use crate::store::{ContentStore, GitHubContentStore};
use std::sync::Arc;

/// Create the content store described by `config`
pub fn create_content_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    Ok(Arc::new(GitHubContentStore::new(&config.api_base)?))
}
