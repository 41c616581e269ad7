// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Handle reservation and account registration routes.

use crate::error::{AppError, Result};
use crate::handle;
use crate::middleware::auth::{create_session_jwt, session_cookie};
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/users/claim", get(claim_handle))
}

// ─── Handle Reservation ──────────────────────────────────────

/// Query parameters for claiming a handle.
#[derive(Deserialize)]
pub struct ClaimParams {
    username: String,
}

/// Validate and normalize a candidate handle, then hand the caller to the
/// registration page with the handle pre-filled. Nothing is persisted:
/// uniqueness is decided at creation time, not here.
async fn claim_handle(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClaimParams>,
) -> Result<Redirect> {
    handle::validate(&params.username).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let username = handle::normalize(&params.username);

    let target = format!(
        "{}/register?username={}",
        state.config.frontend_url,
        urlencoding::encode(&username)
    );

    Ok(Redirect::temporary(&target))
}

// ─── Account Registration ────────────────────────────────────

/// Registration request body.
///
/// Re-validated server-side whatever the client form already checked.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 3, message = "name must be at least 3 characters"))]
    pub name: String,
    #[validate(custom(function = validate_username))]
    pub username: String,
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    handle::validate(username).map_err(|e| {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some(e.to_string().into());
        error
    })
}

/// Created user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Create the user record and establish the session.
///
/// There is no lookup-then-create here: the storage layer's create-only
/// insert on the handle is the uniqueness guard, so two concurrent
/// registrations for the same handle cannot both win.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        handle: handle::normalize(&body.username),
        display_name: body.name,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.create_user(&user).await?;

    // Bind this client to the new user for the rest of the flow
    let jwt = create_session_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let secure = state.config.frontend_url.starts_with("https://");
    let jar = jar.add(session_cookie(jwt, secure));

    tracing::info!(user_id = %user.id, handle = %user.handle, "User registered");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(UserResponse {
            id: user.id,
            name: user.display_name,
            username: user.handle,
        }),
    ))
}
