//! Sync command - push one recorded submission

use crate::cli::cli_engine;
use crate::cli::style::{Stylize, check};
use anstream::println;
use leetsync::config::Config;
use leetsync::error::{Error, Result};
use leetsync::messages::InboundMessage;
use leetsync::sync::header::render_file;
use leetsync::sync::{QueueReason, SyncOutcome};
use leetsync::types::SubmissionRecord;
use std::io::Read;
use std::path::Path;

/// Options for the sync command
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Print the target path and file text instead of writing
    pub dry_run: bool,
}

/// A bare record, or a `SOLUTION_SUBMITTED` message wrapping one
pub fn parse_record(text: &str) -> Result<SubmissionRecord> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("type").is_some() {
        return match serde_json::from_value(value)? {
            InboundMessage::SolutionSubmitted { data } => Ok(data),
            other => Err(Error::Parse(format!(
                "expected a SOLUTION_SUBMITTED message, got {other:?}"
            ))),
        };
    }
    Ok(serde_json::from_value(value)?)
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

/// Run the sync command
pub async fn run_sync(config: &Config, input: &Path, options: SyncOptions) -> Result<()> {
    let record = parse_record(&read_input(input)?)?;
    record.validate(config.min_code_len)?;

    if options.dry_run {
        println!("{} {}", "Would write:".muted(), record.remote_path().accent());
        println!();
        println!("{}", render_file(&record));
        return Ok(());
    }

    let engine = cli_engine(config)?;
    match engine.sync_with_stored_credentials(&record).await? {
        SyncOutcome::Created { path } | SyncOutcome::Updated { path } => {
            println!("{} {}", check(), path.accent());
        }
        SyncOutcome::Queued {
            reason: QueueReason::NoCredentials,
            pending,
        } => {
            println!(
                "{} ({} pending)",
                "Not connected to GitHub; stored locally".warning(),
                pending
            );
            println!(
                "  {} {}",
                "Connect with:".muted(),
                "leetsync auth login && leetsync repo <owner/repository>".accent()
            );
        }
        SyncOutcome::Queued { pending, .. } => {
            println!("{} ({pending} pending)", "Stored locally".warning());
        }
    }
    Ok(())
}
