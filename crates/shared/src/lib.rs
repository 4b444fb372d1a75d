//! Shared types, errors, and configuration for Kardex.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, CostingConfig, DatabaseConfig};
pub use error::{AppError, AppResult};
