//! Errors raised by the costing services.

use kardex_core::kardex::{GroupKey, KardexError};
use kardex_shared::AppError;
use kardex_shared::types::TransactionId;
use sea_orm::DbErr;

/// Error types for costing, adjustment and consistency operations.
#[derive(Debug, thiserror::Error)]
pub enum CostingError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The group has no transactions.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupKey),

    /// No custodian statement on file for the group.
    #[error("No custodian statement for group {0}")]
    StatementNotFound(GroupKey),

    /// The transaction is not an adjustment.
    #[error("Transaction {0} is not an adjustment")]
    NotAdjustable(TransactionId),

    /// Rejected adjustment input.
    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),

    /// A stored row could not be turned into a domain value.
    #[error("Corrupt row in {table}: invalid {field} {value:?}")]
    CorruptRow {
        /// Source table.
        table: &'static str,
        /// Offending column.
        field: &'static str,
        /// Stored value.
        value: String,
    },

    /// Structural failure reported by the engine.
    #[error(transparent)]
    Structural(#[from] KardexError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl CostingError {
    /// Returns the error code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::StatementNotFound(_) => "STATEMENT_NOT_FOUND",
            Self::NotAdjustable(_) => "NOT_ADJUSTABLE",
            Self::InvalidAdjustment(_) => "INVALID_ADJUSTMENT",
            Self::CorruptRow { .. } => "CORRUPT_ROW",
            Self::Structural(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Resets and recosts are idempotent, so a database failure can simply
    /// be retried. Everything else fails the same way twice.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    pub(crate) fn corrupt(table: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::CorruptRow {
            table,
            field,
            value: value.into(),
        }
    }
}

impl From<CostingError> for AppError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::TransactionNotFound(_)
            | CostingError::GroupNotFound(_)
            | CostingError::StatementNotFound(_) => Self::NotFound(err.to_string()),
            CostingError::NotAdjustable(_) => Self::InvalidOperation(err.to_string()),
            CostingError::InvalidAdjustment(_) => Self::Validation(err.to_string()),
            CostingError::CorruptRow { .. } | CostingError::Structural(_) => {
                Self::Structural(err.to_string())
            }
            CostingError::Database(_) => Self::Database(err.to_string()),
        }
    }
}
