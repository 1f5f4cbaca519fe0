//! Ledger Error Types

use thiserror::Error;

/// Ledger engine errors
///
/// The first four variants are deterministic rejections: callers MUST NOT
/// retry them. `Transient` is retried internally with bounded attempts and
/// only surfaces after the budget is exhausted.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Source and destination accounts must differ")]
    SameAccount,

    #[error("One or both accounts not found")]
    AccountNotFound,

    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(i64),

    #[error("Transient storage error: {0}")]
    Transient(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::SameAccount => "SAME_ACCOUNT",
            LedgerError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            LedgerError::Transient(_) => "TRANSIENT",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount
            | LedgerError::SameAccount
            | LedgerError::AccountNotFound
            | LedgerError::InsufficientFunds(_) => 400,
            LedgerError::Transient(_) => 500,
        }
    }

    /// Whether the engine may retry the operation internally
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Transient(e.to_string())
    }
}
