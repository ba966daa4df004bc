//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use propel_api::error::AppError;
use propel_core::error::{CoreError, FieldViolation, RuleViolation};
use propel_core::store::StoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 and lists every field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400_with_details() {
    let err = AppError::Core(CoreError::validation(vec![
        FieldViolation::new("title", "required"),
        FieldViolation::new("deadline", "invalid_format"),
    ]));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["details"].as_array().unwrap().len(), 2);
    assert_eq!(json["details"][0]["field"], "title");
    assert_eq!(json["details"][1]["rule"], "invalid_format");
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Project", "p-1"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id p-1 not found");
    assert!(json.get("details").is_none());
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("application already has a project".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "application already has a project");
}

// ---------------------------------------------------------------------------
// Test: a unique violation from the store surfaces as 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_unique_violation_returns_409() {
    let err = AppError::from(CoreError::from(StoreError::UniqueViolation {
        constraint: "uq_projects_application_id".into(),
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Authorization maps to 403 with FORBIDDEN code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authorization_error_returns_403() {
    let err = AppError::Core(CoreError::Authorization(
        "Only the project creator can manage the team".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Test: CoreError::BusinessRule maps to 422 with its violations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn business_rule_error_returns_422_with_violations() {
    let err = AppError::Core(CoreError::rules(
        "Project cannot start",
        vec![
            RuleViolation::new("min_count_not_met", "student needs 1 more member"),
            RuleViolation::new("min_duration_violation", "deadline too early")
                .with_details(serde_json::json!({ "min_months": 6 })),
        ],
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "BUSINESS_RULE_VIOLATION");
    assert_eq!(json["error"], "Project cannot start");
    assert_eq!(json["details"][0]["rule"], "min_count_not_met");
    assert_eq!(json["details"][1]["details"]["min_months"], 6);
}

// ---------------------------------------------------------------------------
// Test: AppError::Unauthorized maps to 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Unauthorized("Missing Authorization header".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Missing Authorization header");
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Missing required 'file' field".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: internal errors map to 500 and sanitize the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn core_internal_error_returns_500_and_sanitizes() {
    let err = AppError::Core(CoreError::internal("secret connection string leaked"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("secret"));
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn store_failure_returns_500_and_sanitizes() {
    let cause: Box<dyn std::error::Error + Send + Sync> = "pool timed out at 10.0.0.5".into();
    let err = AppError::from(CoreError::from(StoreError::Other(cause)));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json.to_string().contains("10.0.0.5"));
}
