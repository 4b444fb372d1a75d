//! Schema migration runner for the kardex tables.
//!
//! Reads `DATABASE_URL` (or `.env`) and accepts the standard migration
//! subcommands: `up`, `down`, `status`, `fresh`, `refresh`, `reset`.

use kardex_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
