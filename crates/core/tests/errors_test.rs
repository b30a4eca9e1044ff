use std::error::Error;

use campus_core::errors::{CampusError, CampusResult};

#[test]
fn test_campus_error_display() {
    let not_found = CampusError::NotFound("Appointment abc12".to_string());
    let validation = CampusError::Validation("Invalid input".to_string());
    let exhausted = CampusError::AllocationExhausted { attempts: 16 };
    let unique = CampusError::UniqueConstraintViolation("projects_slug_key".to_string());
    let unmet = CampusError::MigrationDependencyUnmet {
        migration: "appointments.0002_appointment_status".to_string(),
        dependency: "appointments.0001_initial".to_string(),
    };
    let cycle = CampusError::MigrationCycle(vec!["a".to_string(), "b".to_string()]);
    let database = CampusError::Database(eyre::eyre!("Database connection failed"));

    assert_eq!(not_found.to_string(), "Resource not found: Appointment abc12");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert_eq!(
        exhausted.to_string(),
        "Could not allocate a unique reference ID after 16 attempts, please retry"
    );
    assert_eq!(
        unique.to_string(),
        "Unique constraint violated: projects_slug_key"
    );
    assert_eq!(
        unmet.to_string(),
        "Migration appointments.0002_appointment_status depends on unknown migration appointments.0001_initial"
    );
    assert_eq!(cycle.to_string(), "Migration dependency cycle between: a, b");
    assert!(database.to_string().contains("Database error:"));
}

#[test]
fn test_only_allocation_exhaustion_is_transient() {
    assert!(CampusError::AllocationExhausted { attempts: 3 }.is_transient());
    assert!(!CampusError::UniqueConstraintViolation("x".to_string()).is_transient());
    assert!(!CampusError::NotFound("x".to_string()).is_transient());
}

#[test]
fn test_backfill_error_keeps_source() {
    let error = CampusError::MigrationBackfill {
        migration: "appointments.0004_populate_reference_id".to_string(),
        source: eyre::eyre!("connection reset"),
    };

    assert!(error.source().is_some());
    assert!(error.to_string().contains("connection reset"));
}

#[test]
fn test_box_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let boxed_error: Box<dyn Error + Send + Sync> = Box::new(io_error);
    let campus_error: CampusError = boxed_error.into();

    assert!(campus_error.to_string().contains("IO error"));
}

#[test]
fn test_campus_result() {
    let result: CampusResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: CampusResult<i32> = Err(CampusError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}
