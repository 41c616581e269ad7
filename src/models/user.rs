//! User and calendar-grant models for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// The document ID is the normalized handle, which is what enforces
/// handle uniqueness at the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier (UUID v4), generated at creation
    pub id: String,
    /// Public booking handle, lowercase, immutable after creation
    pub handle: String,
    /// Display name shown on the booking page
    pub display_name: String,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}

/// Latest Google OAuth grant for a user (encrypted tokens in Firestore).
///
/// Stored provisionally on every callback, whatever scopes were granted;
/// whether the grant is *accepted* is decided by scope evaluation, not
/// by its presence here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarGrant {
    /// Google account identifier (`id` from the userinfo endpoint)
    pub google_account_id: String,
    /// Email address (may be absent if not shared)
    pub email: Option<String>,
    /// Granted OAuth scopes, as returned by the token exchange
    pub granted_scopes: Vec<String>,
    /// Encrypted access token (base64)
    pub access_token_encrypted: String,
    /// Encrypted refresh token (base64); Google only issues one on first consent
    pub refresh_token_encrypted: Option<String>,
    /// When the access token expires (ISO 8601)
    pub expires_at: String,
    /// When this grant was last overwritten (ISO 8601)
    pub updated_at: String,
}
