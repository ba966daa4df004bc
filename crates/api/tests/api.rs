//! Router-level tests: authentication, authorization and input validation
//! that are decided before any database access.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, send, token_for};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Test: unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = send(build_test_app(), Method::GET, "/nope", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: health reports degraded without a database, with a request id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_database_state_and_request_id() {
    let response = send(build_test_app(), Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("response must carry x-request-id")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(request_id.len(), 36);

    let json = body_json(response).await;
    assert_eq!(json["db_healthy"], false);
    assert!(json["storage_healthy"].is_boolean());
    assert_eq!(json["status"], "degraded");
    assert!(json["version"].is_string());
}

// ---------------------------------------------------------------------------
// Test: missing and invalid tokens return 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_returns_401() {
    let response = send(
        build_test_app(),
        Method::POST,
        "/api/v1/applications",
        None,
        Some(json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forged_token_returns_401() {
    let uri = format!("/api/v1/projects/{}/start", Uuid::new_v4());
    let response = send(
        build_test_app(),
        Method::POST,
        &uri,
        Some("not.a.jwt"),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Test: approval requires the reviewer role
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_without_reviewer_role_returns_403() {
    let token = token_for(Uuid::new_v4(), "user");
    let uri = format!("/api/v1/applications/{}/approve", Uuid::new_v4());
    let response = send(
        build_test_app(),
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Test: approval input is validated before touching the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_with_missing_fields_returns_400() {
    let token = token_for(Uuid::new_v4(), "reviewer");
    let uri = format!("/api/v1/applications/{}/approve", Uuid::new_v4());
    let response = send(
        build_test_app(),
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "advisor_user_id": "not-a-uuid" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"project_type_id"));
    assert!(fields.contains(&"advisor_user_id"));
}

// ---------------------------------------------------------------------------
// Test: an unparseable deadline is rejected before any lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unparseable_deadline_returns_400() {
    let token = token_for(Uuid::new_v4(), "user");
    let uri = format!("/api/v1/projects/{}/deadline", Uuid::new_v4());
    let response = send(
        build_test_app(),
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "deadline": "next spring" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "deadline");
}

// ---------------------------------------------------------------------------
// Test: unknown resource targets are rejected
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_resource_target_returns_400() {
    let token = token_for(Uuid::new_v4(), "user");
    let uri = format!("/api/v1/resources/team/{}", Uuid::new_v4());
    let response = send(build_test_app(), Method::GET, &uri, Some(&token), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "model_target");
}
