//! Repo command - choose the target repository

use crate::cli::cli_engine;
use crate::cli::style::{Stylize, check};
use anstream::println;
use leetsync::config::Config;
use leetsync::error::Result;
use leetsync::store::parse_repo_id;

/// Run the repo command
///
/// With a token already saved this also creates the difficulty directories
/// and retries anything queued, as the host does when credentials change.
pub async fn run_repo(config: &Config, input: &str) -> Result<()> {
    let repo = parse_repo_id(input)?;
    let engine = cli_engine(config)?;
    engine.state().set_repo(&repo).await?;
    println!("{} Repository set to {}", check(), repo.to_string().accent());

    let Some(creds) = engine.state().credentials().await? else {
        println!(
            "  {} {}",
            "Next:".muted(),
            "leetsync auth login".accent()
        );
        return Ok(());
    };
    let created = engine.ensure_directories(&creds).await;
    if created > 0 {
        println!("  {} {created}", "Directories created:".muted());
    }
    let report = engine.drain_pending(&creds).await?;
    if report.synced > 0 || report.requeued > 0 {
        println!(
            "  {} synced {}, still pending {}",
            "Pending syncs:".muted(),
            report.synced,
            report.pending
        );
    }
    Ok(())
}
