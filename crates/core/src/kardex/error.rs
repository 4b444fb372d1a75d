//! Structural errors raised by the costing engine.
//!
//! Lot insufficiency is NOT an error: it is reported through the
//! `needs_review` outcome of the offending outflow.

use kardex_shared::types::TransactionId;
use thiserror::Error;

use super::types::GroupKey;

/// Errors that abort a costing pass over one group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KardexError {
    /// A transaction handed to the engine belongs to another group.
    #[error("Transaction {transaction_id} does not belong to group {expected}")]
    GroupMismatch {
        /// The offending transaction.
        transaction_id: TransactionId,
        /// The group being costed.
        expected: GroupKey,
    },

    /// Quantities are unsigned magnitudes.
    #[error("Transaction {0} has a negative quantity")]
    NegativeQuantity(TransactionId),

    /// Prices cannot be negative.
    #[error("Transaction {0} has a negative price")]
    NegativePrice(TransactionId),

    /// Cost arithmetic exceeded the decimal range.
    #[error("Arithmetic overflow while costing transaction {0}")]
    ArithmeticOverflow(TransactionId),
}

impl KardexError {
    /// Returns the error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::GroupMismatch { .. } => "GROUP_MISMATCH",
            Self::NegativeQuantity(_) => "NEGATIVE_QUANTITY",
            Self::NegativePrice(_) => "NEGATIVE_PRICE",
            Self::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
        }
    }

    /// The transaction that triggered the failure.
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::GroupMismatch { transaction_id, .. } => *transaction_id,
            Self::NegativeQuantity(id) | Self::NegativePrice(id) | Self::ArithmeticOverflow(id) => *id,
        }
    }
}
