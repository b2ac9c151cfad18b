//! OAuth relay server
//!
//! A small HTTP service holding the OAuth app secret. It sends the user to
//! GitHub, trades the returned code for a token, and hands the token back to
//! the settings UI that opened it.
//!
//! Endpoints:
//! - GET  /                   - Health check
//! - GET  /auth/github        - Redirect to GitHub's authorize page
//! - GET  /auth/callback      - Exchange `?code=` and post the token to the opener
//! - POST /api/verify-token   - `{token}` to `{valid, username}`
//! - POST /api/repositories   - `{token}` to the repositories it can see

mod handlers;
mod pages;

use crate::config::RelayConfig;
use crate::error::Result;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use self::handlers::{
    handle_authorize, handle_callback, handle_health, handle_not_found, handle_repositories,
    handle_verify_token,
};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct RelayState {
    /// OAuth app settings
    pub config: RelayConfig,
    /// GitHub REST API root, for user and repository lookups
    pub api_base: String,
}

/// Build the relay's routes
pub fn router(state: RelayState) -> Router {
    // Any origin: the caller is a browser extension page.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_health))
        .route("/auth/github", get(handle_authorize))
        .route("/auth/callback", get(handle_callback))
        .route("/api/verify-token", post(handle_verify_token))
        .route("/api/repositories", post(handle_repositories))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve on `0.0.0.0:{port}` until Ctrl+C
pub async fn start_server(state: RelayState) -> Result<()> {
    if state.config.client_id.is_none() || state.config.client_secret.is_none() {
        tracing::warn!("GITHUB_CLIENT_ID or GITHUB_CLIENT_SECRET is not set; OAuth will fail");
    }
    if state.config.opener_origin == "*" {
        tracing::warn!("OPENER_ORIGIN is not set; tokens are posted to any opener");
    }
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "OAuth relay listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("OAuth relay shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
