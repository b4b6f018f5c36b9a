use thiserror::Error;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] sphere_service::error::ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] sphere_db::error::DbError),

    #[error(transparent)]
    AdventError(#[from] sphere_advent::error::AdventError),

    #[error(transparent)]
    CoreError(#[from] sphere_core::error::CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
