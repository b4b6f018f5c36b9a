use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] sphere_db::error::DbError),

    #[error(transparent)]
    AdventError(#[from] sphere_advent::error::AdventError),

    #[error(transparent)]
    CoreError(#[from] sphere_core::error::CoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Edit token mismatch for room {0}")]
    EditTokenMismatch(uuid::Uuid),

    #[error("Day {day} is not openable now")]
    NotOpenable { day: i64 },

    #[error("Image generation limit reached for room {0}")]
    GenerationLimitReached(uuid::Uuid),

    #[error("Bundle write failed after {written} of {total} parts: {source}")]
    BundleWrite {
        written: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("AI backend error: {0}")]
    AiError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
