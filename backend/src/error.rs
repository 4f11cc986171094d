use thiserror::Error;

use warehouse::WarehouseError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed command payload.
    #[error("invalid request payload: {0}")]
    Validation(String),

    /// A domain precondition failed (empty catalog, overfiring, bad map).
    #[error(transparent)]
    Domain(#[from] WarehouseError),

    /// The command exists but has no handler.
    #[error("not implemented")]
    NotImplemented,

    #[error("unauthorized")]
    Auth,

    /// Unknown `type` on an otherwise valid frame.
    #[error("unknown command")]
    UnknownCommand,

    #[error("storage failure")]
    Storage(#[from] sqlx::Error),

    #[error("internal failure")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wire status code for the response frame.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::Domain(_) | AppError::Storage(_) => 400,
            AppError::Auth => 401,
            AppError::NotImplemented => 501,
            AppError::UnknownCommand => 418,
            AppError::Internal(_) => 500,
        }
    }

    /// What the client is told. Internal and storage detail stays in the
    /// logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "storage failure".to_string(),
            AppError::Internal(_) => "fatal server-side failure".to_string(),
            AppError::UnknownCommand => {
                "the teapot cannot brew this command".to_string()
            }
            other => other.to_string(),
        }
    }
}
