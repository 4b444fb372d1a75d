//! Shared fixtures for database integration tests.
//!
//! Each test gets its own in-memory `SQLite` database with migrations applied.
//! The pool holds a single connection, so every unit of work must run on its
//! own database transaction.

#![allow(dead_code)]

use chrono::NaiveDate;
use kardex_core::kardex::{GroupKey, MovementKind, Transaction};
use kardex_db::migration::{Migrator, MigratorTrait};
use kardex_db::{KardexServices, NewTransaction, TransactionRepository};
use kardex_shared::CostingConfig;
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("in-memory sqlite should open");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    db
}

pub fn services(db: &DatabaseConnection) -> KardexServices {
    KardexServices::new(db, &CostingConfig::default())
}

pub fn group(account: &str) -> GroupKey {
    group_of(CompanyId::new(), account)
}

pub fn group_of(company: CompanyId, account: &str) -> GroupKey {
    GroupKey::new(company, CustodianId::new(), InstrumentId::new(), account)
}

pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, n).expect("valid January date")
}

pub async fn record(
    repo: &TransactionRepository,
    group: &GroupKey,
    date: NaiveDate,
    kind: MovementKind,
    quantity: Decimal,
    price: Option<Decimal>,
) -> Transaction {
    repo.save(NewTransaction::movement(group.clone(), date, kind, quantity, price))
        .await
        .expect("transaction should insert")
}

pub async fn buy(
    repo: &TransactionRepository,
    group: &GroupKey,
    date: NaiveDate,
    quantity: Decimal,
    price: Decimal,
) -> Transaction {
    record(repo, group, date, MovementKind::Buy, quantity, Some(price)).await
}

pub async fn sell(
    repo: &TransactionRepository,
    group: &GroupKey,
    date: NaiveDate,
    quantity: Decimal,
) -> Transaction {
    record(repo, group, date, MovementKind::Sell, quantity, Some(Decimal::ONE)).await
}
