use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampusError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not allocate a unique reference ID after {attempts} attempts, please retry")]
    AllocationExhausted { attempts: u32 },

    #[error("Unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("Migration {migration} depends on unknown migration {dependency}")]
    MigrationDependencyUnmet {
        migration: String,
        dependency: String,
    },

    #[error("Migration dependency cycle between: {}", .0.join(", "))]
    MigrationCycle(Vec<String>),

    #[error("Backfill failed in migration {migration}: {source}")]
    MigrationBackfill {
        migration: String,
        #[source]
        source: eyre::Report,
    },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CampusError {
    /// Whether the caller may simply try the same request again.
    pub fn is_transient(&self) -> bool {
        matches!(self, CampusError::AllocationExhausted { .. })
    }
}

pub type CampusResult<T> = Result<T, CampusError>;
