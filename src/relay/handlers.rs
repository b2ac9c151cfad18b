//! Relay route handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use super::pages::{failure_page, success_page};
use super::RelayState;
use crate::auth::{authorize_url, exchange_code, fetch_username, list_repositories};

/// Construct a JSON error response with the given status code and message
fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackParams {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    token: String,
}

/// Fallback for unmatched routes
pub(crate) async fn handle_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /
pub(crate) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "LeetCode GitHub Sync Server Running" }))
}

/// GET /auth/github
pub(crate) async fn handle_authorize(State(state): State<Arc<RelayState>>) -> Response {
    match authorize_url(&state.config) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            warn!(error = %e, "cannot start OAuth flow");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /auth/callback
pub(crate) async fn handle_callback(
    State(state): State<Arc<RelayState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Authorization code not provided").into_response();
    };

    let result = async {
        let token = exchange_code(&state.config, &code).await?;
        let username = fetch_username(&state.api_base, &token).await?;
        Ok::<_, crate::error::Error>((token, username))
    }
    .await;

    match result {
        Ok((token, username)) => {
            debug!(%username, "OAuth flow completed");
            Html(success_page(&token, &username, &state.config.opener_origin)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "OAuth callback failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(failure_page())).into_response()
        }
    }
}

/// POST /api/verify-token
pub(crate) async fn handle_verify_token(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<TokenBody>,
) -> Response {
    match fetch_username(&state.api_base, &body.token).await {
        Ok(username) => Json(serde_json::json!({ "valid": true, "username": username })).into_response(),
        Err(e) => {
            debug!(error = %e, "token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "valid": false, "error": "Invalid token" })),
            )
                .into_response()
        }
    }
}

/// POST /api/repositories
pub(crate) async fn handle_repositories(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<TokenBody>,
) -> Response {
    match list_repositories(&state.api_base, &body.token).await {
        Ok(repos) => Json(repos).into_response(),
        Err(e) => {
            warn!(error = %e, "repository listing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch repositories")
        }
    }
}
