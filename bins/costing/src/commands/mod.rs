//! Subcommand arguments and handlers.

pub mod adjustment;
pub mod costing;
pub mod report;

use clap::Args;
use kardex_core::kardex::GroupKey;
use kardex_db::KardexServices;
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

/// Handles shared by every command.
pub struct Context {
    pub db: DatabaseConnection,
    pub services: KardexServices,
}

/// Identifies one costing group.
#[derive(Args)]
pub struct GroupArgs {
    /// Company id
    #[arg(long)]
    pub company: Uuid,

    /// Custodian id
    #[arg(long)]
    pub custodian: Uuid,

    /// Instrument id
    #[arg(long)]
    pub instrument: Uuid,

    /// Account code
    #[arg(long)]
    pub account: String,
}

impl GroupArgs {
    pub fn key(&self) -> GroupKey {
        GroupKey::new(
            CompanyId::from_uuid(self.company),
            CustodianId::from_uuid(self.custodian),
            InstrumentId::from_uuid(self.instrument),
            self.account.clone(),
        )
    }
}

/// Writes a value to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
