// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Availability-interval endpoint tests.
//!
//! These verify the session precondition and the request-body schema
//! against an offline mock database: an unauthenticated or malformed
//! submission must never reach storage.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

const VALID_BODY: &str = r#"{"intervals": [
    {"weekDay": 1, "startTimeInMinutes": 540, "endTimeInMinutes": 600},
    {"weekDay": 3, "startTimeInMinutes": 480, "endTimeInMinutes": 720}
]}"#;

fn intervals_request(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/users/time-intervals")
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_intervals_without_session() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(intervals_request(VALID_BODY, None)).await.unwrap();

    // No session: terminated with a bare 401 before any storage access
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_intervals_with_invalid_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(intervals_request(VALID_BODY, Some("invalid.token.here")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_intervals_with_session_cookie() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-123", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/time-intervals")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, format!("slotbook:userId={}", token))
                .body(Body::from(VALID_BODY.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Session resolved from the cookie; only the offline mock database can
    // fail past this point.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_intervals_malformed_body() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-123", &state.config.jwt_signing_key);

    // weekDay must be a number
    let body = r#"{"intervals": [{"weekDay": "monday", "startTimeInMinutes": 540, "endTimeInMinutes": 600}]}"#;

    let response = app
        .oneshot(intervals_request(body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_intervals_missing_field() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-123", &state.config.jwt_signing_key);

    let body = r#"{"intervals": [{"weekDay": 1, "startTimeInMinutes": 540}]}"#;

    let response = app
        .oneshot(intervals_request(body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_intervals_negative_week_day() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-123", &state.config.jwt_signing_key);

    let body = r#"{"intervals": [{"weekDay": -1, "startTimeInMinutes": 540, "endTimeInMinutes": 600}]}"#;

    let response = app
        .oneshot(intervals_request(body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_intervals_method_not_allowed() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-123", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/time-intervals")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
