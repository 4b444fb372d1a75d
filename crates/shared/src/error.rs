//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Crate-local errors (costing, engine) convert into this envelope at the
/// binary boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (transaction, group, statement).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error on caller-supplied input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested operation is not allowed on the target.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Structural failure: missing field, unresolved identifier, corrupt group.
    #[error("Structural failure: {0}")]
    Structural(String),

    /// Conflict (e.g., concurrent modification).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for logs and CLI output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Structural(_) => "STRUCTURAL_FAILURE",
            Self::Conflict(_) => "CONFLICT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the process exit code a binary should use for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 3,
            Self::Validation(_) | Self::InvalidOperation(_) => 4,
            Self::Structural(_) => 5,
            Self::Conflict(_) => 6,
            Self::Configuration(_) => 78,
            Self::Database(_) | Self::Internal(_) => 1,
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Database(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
