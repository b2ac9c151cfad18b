//! Pending command - inspect, drain or clear the local queue

use crate::cli::style::{Stylize, check};
use crate::cli::{cli_engine, open_state};
use anstream::println;
use dialoguer::Confirm;
use leetsync::config::Config;
use leetsync::error::{Error, Result};

/// What `pending` should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// List queued records
    List,
    /// Retry queued records now
    Drain,
    /// Delete queued records
    Clear {
        /// Skip the confirmation prompt
        yes: bool,
    },
}

/// Run the pending command
pub async fn run_pending(config: &Config, action: PendingAction) -> Result<()> {
    match action {
        PendingAction::List => list(config).await,
        PendingAction::Drain => drain(config).await,
        PendingAction::Clear { yes } => clear(config, yes).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let state = open_state(config);
    let pending = state.pending().await?;
    if pending.is_empty() {
        println!("No pending syncs");
    } else {
        println!("{}", format!("{} pending sync(s)", pending.len()).emphasis());
        for record in &pending {
            println!(
                "  {} {}",
                record.remote_path().accent(),
                record.timestamp.format("%Y-%m-%d %H:%M").muted()
            );
        }
    }
    if let Some(last) = state.last_sync().await? {
        println!();
        println!(
            "{} {} ({})",
            "Last sync:".muted(),
            last.file,
            last.at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

async fn drain(config: &Config) -> Result<()> {
    let engine = cli_engine(config)?;
    let Some(creds) = engine.state().credentials().await? else {
        return Err(Error::Auth(
            "not connected; run `leetsync auth login` and `leetsync repo <owner/repository>` first"
                .to_string(),
        ));
    };
    let report = engine.drain_pending(&creds).await?;
    if report.synced == 0 && report.requeued == 0 {
        println!("No pending syncs");
    } else {
        println!(
            "{} Synced {}, still pending {}",
            check(),
            report.synced.accent(),
            report.pending.accent()
        );
    }
    Ok(())
}

async fn clear(config: &Config, yes: bool) -> Result<()> {
    let state = open_state(config);
    let count = state.pending_count().await?;
    if count == 0 {
        println!("No pending syncs");
        return Ok(());
    }
    if !yes
        && !Confirm::new()
            .with_prompt(format!("Delete {count} pending sync(s)?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("failed to read confirmation: {e}")))?
    {
        println!("{}", "Aborted".muted());
        return Ok(());
    }
    state.clear_pending().await?;
    println!("{} Cleared {count} pending sync(s)", check());
    Ok(())
}
