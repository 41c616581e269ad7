// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::UserTimeInterval;
use crate::services::google::evaluate_scopes;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a session via the auth middleware).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/time-intervals", post(create_time_intervals))
        .route("/api/me", get(get_me))
}

// ─── Availability Intervals ──────────────────────────────────

/// Weekly availability submission body.
///
/// Serde enforces the shape (every field a number); range and overlap
/// policy is deliberately not checked here.
#[derive(Debug, Deserialize)]
pub struct TimeIntervalsBody {
    intervals: Vec<TimeIntervalInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeIntervalInput {
    week_day: u8,
    start_time_in_minutes: u32,
    end_time_in_minutes: u32,
}

/// Persist the user's weekly availability windows as one atomic batch.
///
/// Every row is tagged with the session's user id. The storage layer
/// commits all rows in a single transaction, so the caller either gets a
/// full week or nothing.
async fn create_time_intervals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<TimeIntervalsBody>,
) -> Result<StatusCode> {
    let now = chrono::Utc::now().to_rfc3339();

    let rows: Vec<UserTimeInterval> = body
        .intervals
        .iter()
        .map(|interval| UserTimeInterval {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.user_id.clone(),
            week_day: interval.week_day,
            start_minutes: interval.start_time_in_minutes,
            end_minutes: interval.end_time_in_minutes,
            created_at: now.clone(),
        })
        .collect();

    state.db.insert_time_intervals(&rows).await?;

    tracing::info!(
        user_id = %user.user_id,
        count = rows.len(),
        "Availability intervals stored"
    );

    Ok(StatusCode::CREATED)
}

// ─── Session State ───────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    /// True iff the latest grant covers the calendar scope
    pub calendar_connected: bool,
}

/// Get the current user's profile and calendar-connection state.
///
/// The frontend renders "connected" vs "not connected" from this; the
/// remediation banner is driven by the `?error=permissions` marker on the
/// redirect, not by this endpoint.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let calendar_connected = match state.db.get_calendar_grant(&user.user_id).await? {
        Some(grant) => evaluate_scopes(&grant.granted_scopes).is_accepted(),
        None => false,
    };

    Ok(Json(MeResponse {
        id: profile.id,
        name: profile.display_name,
        username: profile.handle,
        calendar_connected,
    }))
}
