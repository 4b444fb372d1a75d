//! Database layer with `SeaORM` entities, repositories and costing services.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for the transaction source and derived tables
//! - Services owning per-group units of work (costing, adjustments, checks)
//! - Database migrations

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod services;

pub use error::CostingError;
pub use repositories::{
    BalanceRepository, CustodianBalanceRepository, LedgerRepository, NewTransaction,
    TransactionRepository,
};
pub use services::{
    AdjustmentService, ConsistencyChecker, CostingService, CreateAdjustment, KardexServices,
};

use std::time::Duration;

use kardex_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
