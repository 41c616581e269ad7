// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage; handle uniqueness via document IDs)
//! - Calendar grants (encrypted OAuth tokens + granted scopes)
//! - Time intervals (weekly availability windows)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CalendarGrant, User, UserTimeInterval};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user, enforcing handle uniqueness at the storage layer.
    ///
    /// The document ID is the normalized handle and the write is a
    /// create-only insert: a concurrent registration for the same handle
    /// loses with a data-conflict error, which we report as
    /// `DuplicateHandle`. There is no separate existence check to race
    /// against.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let result: Result<User, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.handle)
            .object(user)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                Err(AppError::DuplicateHandle)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Get a user by their normalized handle.
    pub async fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(handle)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by their opaque ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("id").eq(user_id)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    // ─── Calendar Grant Operations ───────────────────────────────

    /// Get the latest calendar grant for a user.
    pub async fn get_calendar_grant(
        &self,
        user_id: &str,
    ) -> Result<Option<CalendarGrant>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CALENDAR_GRANTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the calendar grant for a user, overwriting any previous one.
    ///
    /// The core keeps only the latest grant; historical grants are not
    /// versioned.
    pub async fn set_calendar_grant(
        &self,
        user_id: &str,
        grant: &CalendarGrant,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CALENDAR_GRANTS)
            .document_id(user_id)
            .object(grant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Time Interval Operations ────────────────────────────────

    /// Store a batch of availability intervals in a single transaction.
    ///
    /// All rows commit or none do, so a failed submission never leaves a
    /// partial week behind. Firestore caps transaction size, so a batch
    /// that cannot fit in one transaction is rejected outright.
    pub async fn insert_time_intervals(
        &self,
        intervals: &[UserTimeInterval],
    ) -> Result<(), AppError> {
        if intervals.is_empty() {
            return Ok(());
        }
        if intervals.len() > BATCH_SIZE {
            return Err(AppError::BadRequest(format!(
                "Too many intervals in one submission (max {})",
                BATCH_SIZE
            )));
        }

        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for interval in intervals {
            client
                .fluent()
                .update()
                .in_col(collections::TIME_INTERVALS)
                .document_id(&interval.id)
                .object(interval)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add interval to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %intervals[0].user_id,
            count = intervals.len(),
            "Interval batch committed"
        );

        Ok(())
    }

    /// List a user's availability intervals, ordered by day then start.
    pub async fn list_time_intervals(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserTimeInterval>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TIME_INTERVALS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([
                ("week_day", firestore::FirestoreQueryDirection::Ascending),
                (
                    "start_minutes",
                    firestore::FirestoreQueryDirection::Ascending,
                ),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
