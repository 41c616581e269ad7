// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authorization-gate routes.
//!
//! Both the consent redirect and the callback require an existing session:
//! the grant must land on the user the registration step created. The
//! callback consumes the scope decision from the service layer and turns
//! it into a redirect target: acceptance continues to the default
//! post-auth route, rejection goes to the remediation page.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_jwt, removal_cookie, session_cookie, AuthUser};
use crate::services::ScopeDecision;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Routes that require a session (applied via the auth middleware).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
}

/// Routes that work without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// Start the connect-calendar flow - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let oauth_state = sign_state(&state.config.frontend_url, &state.config.oauth_state_key)?;

    let callback_url = format!("{}/auth/google/callback", request_base_url(&headers));
    let auth_url = state.google.authorize_url(&callback_url, &oauth_state);

    tracing::info!(
        user_id = %user.user_id,
        "Starting connect-calendar flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code, store the grant, evaluate scopes.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = params
        .state
        .as_deref()
        .and_then(|s| verify_and_decode_state(s, &state.config.oauth_state_key))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Provider-side errors (consent denial, etc.) pass through untouched;
    // nothing is stored and no decision is made.
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!(
            "{}/register/connect-calendar?error={}",
            frontend_url,
            urlencoding::encode(&error)
        );
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!(user_id = %user.user_id, "Exchanging authorization code");

    let callback_url = format!("{}/auth/google/callback", request_base_url(&headers));
    let outcome = state
        .google
        .connect_calendar(&user.user_id, &code, &callback_url)
        .await?;

    // The session continues to exist whatever the decision was; a rejected
    // scope only changes where we send the browser next.
    let jwt = create_session_jwt(&user.user_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let secure = frontend_url.starts_with("https://");
    let jar = jar.add(session_cookie(jwt, secure));

    let redirect = match outcome.decision {
        ScopeDecision::Accepted => {
            tracing::info!(user_id = %user.user_id, "Calendar scope granted");
            format!("{}/register/connect-calendar", frontend_url)
        }
        ScopeDecision::Rejected(reason) => {
            tracing::warn!(
                user_id = %user.user_id,
                reason = %reason,
                "Calendar scope rejected, routing to remediation"
            );
            format!(
                "{}/register/connect-calendar/?error={}",
                frontend_url,
                reason.error_marker()
            )
        }
    };

    Ok((jar, Redirect::temporary(&redirect)))
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let secure = state.config.frontend_url.starts_with("https://");
    let jar = jar.add(removal_cookie(secure));
    (StatusCode::NO_CONTENT, jar)
}

/// Reconstruct this service's externally visible base URL from the Host
/// header (Cloud Run sits behind a proxy, so the scheme is inferred).
fn request_base_url(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}", scheme, host)
}

/// Sign `frontend_url|timestamp` with HMAC-SHA256 and base64-encode it as
/// the OAuth state parameter.
fn sign_state(frontend_url: &str, secret: &[u8]) -> Result<String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Create the data payload: "frontend_url|timestamp_hex"
    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    // Sign the payload
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    // Combine payload + signature: "payload|signature_hex"
    // We stick to hex for the signature part to keep it simple within the pipe-delimited format
    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));

    // Base64 encode the whole thing for the URL
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify HMAC signature and decode the frontend URL from the OAuth state parameter.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let frontend_url = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    // Reconstruct payload and verify signature
    let payload = format!("{}|{}", frontend_url, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}
