// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google;
pub mod kms;

pub use google::{ConnectOutcome, GoogleService, ScopeDecision, ScopeRejection};
pub use kms::KmsService;
