//! Auth command - log in, test and manage the GitHub token

use crate::cli::open_state;
use crate::cli::style::{Stylize, check, spinner_style};
use anstream::println;
use dialoguer::{Confirm, Password};
use indicatif::ProgressBar;
use leetsync::auth::{fetch_username, get_github_auth};
use leetsync::config::Config;
use leetsync::error::{Error, Result};
use std::time::Duration;

/// What `auth` should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Verify and save a token
    Login {
        /// Token; prompted for when absent
        token: Option<String>,
    },
    /// Check the token in use
    Test,
    /// Show setup instructions
    Setup,
    /// Forget the token, repository, queue and sync history
    Logout {
        /// Skip the confirmation prompt
        yes: bool,
    },
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the auth login command
pub async fn run_auth_login(config: &Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => Password::new()
            .with_prompt("GitHub token")
            .interact()
            .map_err(|e| Error::Internal(format!("failed to read token: {e}")))?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("token is empty".to_string()));
    }

    let spinner = spinner("Verifying token...");
    let result = fetch_username(&config.api_base, &token).await;
    spinner.finish_and_clear();
    let username = result?;

    open_state(config).set_token(&token, Some(&username)).await?;
    println!("{} Logged in as: {}", check(), username.accent());
    println!(
        "  {} {}",
        "Next:".muted(),
        "leetsync repo <owner/repository>".accent()
    );
    Ok(())
}

/// Run the auth test command
pub async fn run_auth_test(config: &Config) -> Result<()> {
    let spinner = spinner("Testing GitHub authentication...");
    let state = open_state(config);
    let result = async {
        let auth = get_github_auth(&state).await?;
        let username = fetch_username(&config.api_base, &auth.token).await?;
        Ok::<_, Error>((auth, username))
    }
    .await;
    spinner.finish_and_clear();
    let (auth, username) = result?;

    println!("{} Authenticated as: {}", check(), username.accent());
    println!("  {} {}", "Token source:".muted(), auth.source);
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("{}", "GitHub Authentication Setup".emphasis());
    println!();
    println!("{}", "Option 1: Personal access token".emphasis());
    println!(
        "  Create one with the {} scope at {}",
        "repo".accent(),
        "https://github.com/settings/tokens".accent()
    );
    println!("  Run: {}", "leetsync auth login".accent());
    println!();
    println!("{}", "Option 2: Environment variable".emphasis());
    println!(
        "  Set {} or {}",
        "GITHUB_TOKEN".accent(),
        "GH_TOKEN".accent()
    );
    println!();
    println!("{}", "Option 3: GitHub CLI".emphasis());
    println!("  Run: {}", "gh auth login".accent());
    println!();
    println!("{}", "Browser sign-in:".muted());
    println!(
        "  {}",
        "Run `leetsync serve` with GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET set".muted()
    );
}

/// Run the auth logout command
pub async fn run_auth_logout(config: &Config, yes: bool) -> Result<()> {
    if !yes
        && !Confirm::new()
            .with_prompt("Disconnect and delete all local sync state, including pending syncs?")
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("failed to read confirmation: {e}")))?
    {
        println!("{}", "Aborted".muted());
        return Ok(());
    }
    open_state(config).clear().await?;
    println!("{} Disconnected", check());
    Ok(())
}

/// Wrapper for auth commands
pub async fn run_auth(config: &Config, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { token } => run_auth_login(config, token).await,
        AuthAction::Test => run_auth_test(config).await,
        AuthAction::Setup => {
            run_auth_setup();
            Ok(())
        }
        AuthAction::Logout { yes } => run_auth_logout(config, yes).await,
    }
}
