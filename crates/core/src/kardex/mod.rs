//! FIFO inventory costing ("kardex").
//!
//! This module implements the pure side of security-position costing:
//! - Domain types (transactions, kardex rows, FIFO consumption trail)
//! - The FIFO lot ledger engine
//! - Running and consolidated balances
//! - Adjustment proposals for transactions flagged for review
//! - Engine-versus-custodian consistency comparison
//! - Structural error types

pub mod advisor;
pub mod balance;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use advisor::{AdjustmentAdvisor, AdjustmentProposal, PriceSource};
pub use balance::{ConsolidatedBalance, DEFAULT_UNIT_COST_SCALE, RunningBalance, unit_cost};
pub use consistency::{ConsistencyReport, ConsistencyStatus, ExternalBalance};
pub use engine::{CostingOutcome, KardexEngine, KardexRun};
pub use error::KardexError;
pub use types::{
    AccountingEffect, AdjustmentClass, AdjustmentDirection, ConsumptionDetail, GroupKey,
    KardexEntry, MovementKind, OpenLot, Transaction, UnknownCode,
};
