//! Status command

use crate::cli::open_state;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use leetsync::config::Config;
use leetsync::error::Result;

/// Run the status command
pub async fn run_status(config: &Config) -> Result<()> {
    let report = open_state(config).report().await?;

    if report.connected {
        println!("{} Connected", check());
    } else {
        println!("{} Not connected", cross());
    }
    println!(
        "  {} {}",
        "Account:".muted(),
        report.username.as_deref().unwrap_or("-")
    );
    println!(
        "  {} {}",
        "Repository:".muted(),
        report.repo.as_deref().unwrap_or("-")
    );
    println!("  {} {}", "Branch:".muted(), config.branch);
    println!("  {} {}", "Pending syncs:".muted(), report.pending);
    match (report.last_sync, report.last_synced_file) {
        (Some(at), Some(file)) => println!(
            "  {} {} ({})",
            "Last sync:".muted(),
            file,
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        _ => println!("  {} never", "Last sync:".muted()),
    }
    Ok(())
}
