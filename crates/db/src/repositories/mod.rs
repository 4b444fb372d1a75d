//! Repository abstractions for data access.

pub mod balance;
pub mod custodian_balance;
pub mod ledger;
pub mod transaction;

pub use balance::BalanceRepository;
pub use custodian_balance::CustodianBalanceRepository;
pub use ledger::{DeletedRows, LedgerRepository};
pub use transaction::{NewTransaction, TransactionRepository};
