// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slotbook: claim a booking handle, connect your calendar, publish availability
//!
//! This crate provides the backend API for the registration flow: handle
//! reservation, account creation, Google Calendar authorization, and
//! weekly availability storage.

pub mod config;
pub mod db;
pub mod error;
pub mod handle;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::GoogleService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub google: GoogleService,
}
