//! `SeaORM` entity definitions.
//!
//! Enumerations are stored as their string codes and parsed back through the
//! `FromStr` impls of the core types.

pub mod consolidated_balances;
pub mod consumption_details;
pub mod custodian_balances;
pub mod ledger_entries;
pub mod transactions;
