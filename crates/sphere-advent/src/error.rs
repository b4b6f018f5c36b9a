use thiserror::Error;

/// Snapshot construction and validation errors
#[derive(Error, Debug)]
pub enum AdventError {
    #[error("Invalid vector: expected 3 components, got {0}")]
    InvalidVectorLength(usize),

    #[error(transparent)]
    CoreError(#[from] sphere_core::error::CoreError),
}

pub type AdventResult<T> = std::result::Result<T, AdventError>;
