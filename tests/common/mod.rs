// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use slotbook::config::Config;
use slotbook::db::FirestoreDb;
use slotbook::routes::create_router;
use slotbook::services::{GoogleService, KmsService};
use slotbook::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(Config::test_default(), test_db_offline())
}

/// Create a test app with a specific frontend URL (for cookie/CORS tests).
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    build_app(config, test_db_offline())
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    build_app(Config::test_default(), test_db().await)
}

fn build_app(config: Config, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let kms = KmsService::new_mock();

    let google = GoogleService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        db.clone(),
        kms,
    );

    let state = Arc::new(AppState { config, db, google });

    (create_router(state.clone()), state)
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    slotbook::middleware::auth::create_session_jwt(user_id, signing_key)
        .expect("JWT creation should succeed")
}
