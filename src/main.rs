// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slotbook API Server
//!
//! Takes an anonymous visitor through handle reservation, account creation,
//! Google Calendar authorization, and weekly availability submission.

use slotbook::{
    config::Config,
    db::FirestoreDb,
    services::{GoogleService, KmsService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Slotbook API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize KMS service for grant token encryption
    let kms = KmsService::new(&config.gcp_project_id, &config.gcp_region, "grant-encryption")
        .await
        .expect("Failed to initialize KMS service");
    tracing::info!("KMS service initialized");

    // Initialize Google OAuth service
    let google = GoogleService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        db.clone(),
        kms,
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        google,
    });

    // Build router
    let app = slotbook::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slotbook=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
