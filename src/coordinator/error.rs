//! Transfer Coordinator Error Types

use thiserror::Error;

/// Coordinator errors
///
/// Everything except `Database` is a deterministic rejection and is never
/// retried. `IdempotencyConflict` covers the divergent-payload case: the key
/// was seen before with different transfer parameters.
#[derive(Error, Debug, Clone)]
pub enum CoordinatorError {
    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Source and destination accounts must differ")]
    SameAccount,

    #[error("Idempotency key must not be empty")]
    MissingIdempotencyKey,

    #[error("Idempotency key already used with different transfer parameters")]
    IdempotencyConflict,

    #[error("Batch size must be between 1 and {0}")]
    BatchSize(usize),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl CoordinatorError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::InvalidAmount => "INVALID_AMOUNT",
            CoordinatorError::SameAccount => "SAME_ACCOUNT",
            CoordinatorError::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            CoordinatorError::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            CoordinatorError::BatchSize(_) => "BATCH_SIZE",
            CoordinatorError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            CoordinatorError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            CoordinatorError::InvalidAmount
            | CoordinatorError::SameAccount
            | CoordinatorError::MissingIdempotencyKey
            | CoordinatorError::IdempotencyConflict
            | CoordinatorError::BatchSize(_) => 400,
            CoordinatorError::TransferNotFound(_) => 404,
            CoordinatorError::Database(_) => 500,
        }
    }
}

impl From<sqlx::Error> for CoordinatorError {
    fn from(e: sqlx::Error) -> Self {
        CoordinatorError::Database(e.to_string())
    }
}
