// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client and calendar-authorization gate.
//!
//! Handles:
//! - Authorization URL construction (email + profile + calendar scopes)
//! - Authorization-code exchange
//! - Userinfo lookup for the granting account
//! - Scope evaluation as an explicit state-machine transition

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::CalendarGrant;
use crate::services::KmsService;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Scopes requested on every "connect calendar" attempt.
pub const SCOPE_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";
pub const SCOPE_PROFILE: &str = "https://www.googleapis.com/auth/userinfo.profile";
/// The scope the scheduling feature cannot work without.
pub const SCOPE_CALENDAR: &str = "https://www.googleapis.com/auth/calendar";

/// Outcome of evaluating a grant's scope set.
///
/// Consumed by the routing layer to pick a redirect destination; the gate
/// itself never encodes control flow as a path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// The grant covers the calendar scope; proceed to the default
    /// post-auth route.
    Accepted,
    /// The grant is missing a required scope; route to remediation.
    Rejected(ScopeRejection),
}

impl ScopeDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScopeDecision::Accepted)
    }
}

/// Why a grant was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRejection {
    CalendarScopeMissing,
}

impl ScopeRejection {
    /// Query-parameter marker the remediation page keys off.
    pub fn error_marker(&self) -> &'static str {
        match self {
            ScopeRejection::CalendarScopeMissing => "permissions",
        }
    }
}

impl fmt::Display for ScopeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeRejection::CalendarScopeMissing => write!(f, "calendar scope missing"),
        }
    }
}

/// Evaluate a granted scope set: accepted iff it contains the calendar
/// scope literal. Each sign-in attempt is evaluated independently.
pub fn evaluate_scopes(granted: &[String]) -> ScopeDecision {
    if granted.iter().any(|s| s == SCOPE_CALENDAR) {
        ScopeDecision::Accepted
    } else {
        ScopeDecision::Rejected(ScopeRejection::CalendarScopeMissing)
    }
}

/// Split Google's space-delimited scope string into a scope set.
pub fn parse_scope_string(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(|s| s.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// GoogleClient - low-level OAuth endpoints
// ─────────────────────────────────────────────────────────────────────────────

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    client_secret: String,
}

impl GoogleClient {
    /// Create a new Google client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    /// Build the authorization URL for the consent screen.
    ///
    /// `access_type=offline` + `prompt=consent` so Google issues a refresh
    /// token; without it the stored grant goes stale in an hour.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        let scope = format!("{} {} {}", SCOPE_EMAIL, SCOPE_PROFILE, SCOPE_CALENDAR);

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            state
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::GoogleApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Failed to parse token response: {}", e)))
    }

    /// Fetch the granting account's profile.
    pub async fn get_userinfo(&self, access_token: &str) -> Result<GoogleUserinfo, AppError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GoogleApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)))
    }
}

/// Token exchange response from Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    /// Only present when the consent screen was actually shown
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Space-delimited scopes the user actually granted
    pub scope: String,
}

/// Userinfo endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserinfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GoogleService - callback handling + grant storage
// ─────────────────────────────────────────────────────────────────────────────

/// Result of handling a connect-calendar callback.
pub struct ConnectOutcome {
    /// Tagged transition result for the routing layer.
    pub decision: ScopeDecision,
    /// Scopes the provider actually granted.
    pub granted_scopes: Vec<String>,
}

/// High-level Google service for the calendar-authorization gate.
#[derive(Clone)]
pub struct GoogleService {
    client: GoogleClient,
    db: FirestoreDb,
    kms: KmsService,
}

impl GoogleService {
    /// Create a new Google service.
    pub fn new(
        client_id: String,
        client_secret: String,
        db: FirestoreDb,
        kms: KmsService,
    ) -> Self {
        Self {
            client: GoogleClient::new(client_id, client_secret),
            db,
            kms,
        }
    }

    /// Build the authorization URL for the consent screen.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        self.client.authorize_url(redirect_uri, state)
    }

    /// Handle the connect-calendar callback for an authenticated user.
    ///
    /// Exchanges the code, stores the grant (encrypted tokens + scope set)
    /// whatever the scopes turn out to be, and returns the scope decision.
    /// The grant is stored even when the decision is `Rejected`: the
    /// session survives a rejected scope, and the remediation page lets
    /// the user retry with a fresh consent screen.
    pub async fn connect_calendar(
        &self,
        user_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ConnectOutcome, AppError> {
        // Exchange code for tokens
        let token_response = self.client.exchange_code(code, redirect_uri).await?;
        let granted_scopes = parse_scope_string(&token_response.scope);

        // Identify the granting Google account
        let userinfo = self.client.get_userinfo(&token_response.access_token).await?;

        // Encrypt and store the grant
        let now = Utc::now();
        let (enc_access, enc_refresh) = crate::services::kms::encrypt_tokens(
            &self.kms,
            &token_response.access_token,
            token_response.refresh_token.as_deref(),
        )
        .await?;

        let grant = CalendarGrant {
            google_account_id: userinfo.id,
            email: userinfo.email,
            granted_scopes: granted_scopes.clone(),
            access_token_encrypted: enc_access,
            refresh_token_encrypted: enc_refresh,
            expires_at: (now + Duration::seconds(token_response.expires_in)).to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        self.db.set_calendar_grant(user_id, &grant).await?;

        let decision = evaluate_scopes(&granted_scopes);

        tracing::info!(
            user_id,
            accepted = decision.is_accepted(),
            scopes = ?granted_scopes,
            "Calendar grant stored and evaluated"
        );

        Ok(ConnectOutcome {
            decision,
            granted_scopes,
        })
    }
}
