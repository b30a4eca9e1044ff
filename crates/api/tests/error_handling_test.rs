use axum::body::to_bytes;
use axum::http::StatusCode;
use campus_api::middleware::error_handling::map_error;
use campus_core::errors::CampusError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

#[rstest]
#[case(CampusError::NotFound("Appointment".to_string()), StatusCode::NOT_FOUND)]
#[case(CampusError::Validation("Bad reference".to_string()), StatusCode::BAD_REQUEST)]
#[case(
    CampusError::UniqueConstraintViolation("projects_slug_key".to_string()),
    StatusCode::CONFLICT
)]
#[case(
    CampusError::AllocationExhausted { attempts: 16 },
    StatusCode::SERVICE_UNAVAILABLE
)]
#[case(
    CampusError::MigrationCycle(vec!["a".to_string(), "b".to_string()]),
    StatusCode::INTERNAL_SERVER_ERROR
)]
#[case(
    CampusError::Database(eyre::eyre!("connection refused")),
    StatusCode::INTERNAL_SERVER_ERROR
)]
#[case(
    CampusError::Internal(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "boom"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: CampusError, #[case] expected: StatusCode) {
    let response = map_error(error);

    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn test_exhaustion_body_invites_retry() {
    let response = map_error(CampusError::AllocationExhausted { attempts: 16 });
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    let message = json["error"].as_str().unwrap();
    assert!(message.contains("16 attempts"));
    assert!(message.contains("retry"));
}
