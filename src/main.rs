//! leetsync - keep accepted LeetCode solutions in a GitHub repository
//!
//! CLI binary: native-messaging host, OAuth relay and local queue tools.

use anyhow::Result;
use clap::{Parser, Subcommand};
use leetsync::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "leetsync")]
#[command(about = "Sync accepted LeetCode solutions into a GitHub repository")]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as the browser's native-messaging host (stdin/stdout frames)
    Host,

    /// Push one recorded submission
    Sync {
        /// Record JSON file, or - for stdin
        file: PathBuf,

        /// Print the target path and file text instead of writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect, retry or clear queued submissions
    Pending {
        /// Retry queued submissions now
        #[arg(long, conflicts_with = "clear")]
        drain: bool,

        /// Delete queued submissions
        #[arg(long)]
        clear: bool,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show connection and sync status
    Status,

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },

    /// Choose the repository solutions are written to
    Repo {
        /// owner/repository or a GitHub URL
        repo: String,
    },

    /// Run the OAuth relay server
    Serve {
        /// Listen port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a recorded page session through the submission watcher
    Replay {
        /// Trace file (JSON lines)
        trace: PathBuf,

        /// Print accepted submissions instead of syncing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum AuthCommand {
    /// Verify and save a GitHub token
    Login {
        /// Token (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Test authentication
    Test,
    /// Show authentication setup instructions
    Setup,
    /// Forget the saved token, repository and queue
    Logout {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "leetsync=info",
        2 => "leetsync=debug",
        _ => "leetsync=trace",
    };
    let filter = EnvFilter::try_from_env("LEETSYNC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // stdout belongs to the host protocol and command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Host => cli::run_host(&config).await?,
        Commands::Sync { file, dry_run } => {
            cli::run_sync(&config, &file, cli::SyncOptions { dry_run }).await?;
        }
        Commands::Pending { drain, clear, yes } => {
            let action = if drain {
                cli::PendingAction::Drain
            } else if clear {
                cli::PendingAction::Clear { yes }
            } else {
                cli::PendingAction::List
            };
            cli::run_pending(&config, action).await?;
        }
        Commands::Status => cli::run_status(&config).await?,
        Commands::Auth { action } => {
            let action = match action {
                AuthCommand::Login { token } => cli::AuthAction::Login { token },
                AuthCommand::Test => cli::AuthAction::Test,
                AuthCommand::Setup => cli::AuthAction::Setup,
                AuthCommand::Logout { yes } => cli::AuthAction::Logout { yes },
            };
            cli::run_auth(&config, action).await?;
        }
        Commands::Repo { repo } => cli::run_repo(&config, &repo).await?,
        Commands::Serve { port } => cli::run_serve(&config, port).await?,
        Commands::Replay { trace, dry_run } => {
            cli::run_replay(&config, &trace, dry_run).await?;
        }
    }

    Ok(())
}
