// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration endpoint validation tests.
//!
//! These run against an offline mock database: every request here is
//! expected to be settled (or at least fully validated) before storage
//! is touched.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn register_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_method_not_allowed() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_register_short_username() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(register_request(
            r#"{"name": "João Silva", "username": "jo"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_username_with_invalid_characters() {
    let (app, _) = common::create_test_app();

    for username in ["joao_silva", "joao silva", "joao1", "joão"] {
        let body = format!(r#"{{"name": "João Silva", "username": "{}"}}"#, username);
        let response = app
            .clone()
            .oneshot(register_request(&body))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "username {:?} should be rejected",
            username
        );
    }
}

#[tokio::test]
async fn test_register_short_name() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(register_request(
            r#"{"name": "Jo", "username": "joao-silva"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(register_request(r#"{"name": "João Silva"}"#))
        .await
        .unwrap();

    // Schema validation failure happens before any storage access
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_register_valid_body_reaches_storage() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(register_request(
            r#"{"name": "João Silva", "username": "Joao-Silva"}"#,
        ))
        .await
        .unwrap();

    // Validation passed; the offline mock database is the only thing that
    // can fail here, so a 500 proves the request made it to storage.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_claim_redirects_with_normalized_handle() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/claim?username=Joao-Silva")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        location,
        "http://localhost:3000/register?username=joao-silva"
    );
}

#[tokio::test]
async fn test_claim_rejects_invalid_handle() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/claim?username=xy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
