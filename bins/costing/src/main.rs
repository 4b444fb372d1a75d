//! Kardex costing CLI.
//!
//! Drives batch costing runs, group resets, adjustments and custodian checks
//! against the configured database.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kardex_db::{CostingError, KardexServices, connect};
use kardex_shared::{AppConfig, AppError};

use crate::commands::Context;

#[derive(Parser)]
#[command(name = "kardex")]
#[command(about = "FIFO securities costing: runs, resets, adjustments and checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cost every group with pending transactions
    RunAll,
    /// Delete derived rows of a group from a date onwards
    Reset(commands::costing::ResetArgs),
    /// Reset and recost a group in one unit of work
    Recost(commands::costing::RecostArgs),
    /// Delete a group's transactions after a date and recost
    Purge(commands::costing::PurgeArgs),
    /// Propose a corrective adjustment for a transaction
    Propose(commands::adjustment::ProposeArgs),
    /// Record an adjustment
    Adjust(commands::adjustment::AdjustArgs),
    /// Delete an adjustment and its derived rows
    DeleteAdjustment(commands::adjustment::DeleteArgs),
    /// List a group's transactions flagged for review
    Review(commands::GroupArgs),
    /// Compare a group with its latest custodian statement
    Check(commands::GroupArgs),
    /// Check every group of a company that has a statement
    CheckCompany(commands::report::CompanyArgs),
    /// Record a custodian statement line
    Statement(commands::report::StatementArgs),
    /// Show a page of a group's kardex
    Ledger(commands::report::LedgerArgs),
    /// Show the consumption trail of an outflow
    Trail(commands::report::TrailArgs),
    /// Show the consolidated balance of a group
    Balance(commands::GroupArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kardex=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let app_error = classify(err);
            error!(code = app_error.error_code(), error = %app_error, "Command failed");
            ExitCode::from(u8::try_from(app_error.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load().map_err(AppError::from)?;

    let db = connect(&config.database)
        .await
        .map_err(|err| AppError::Database(err.to_string()))?;
    info!("Connected to database");

    let ctx = Context {
        services: KardexServices::new(&db, &config.costing),
        db,
    };

    match cli.command {
        Command::RunAll => commands::costing::run_all(&ctx).await,
        Command::Reset(args) => commands::costing::reset(&ctx, &args).await,
        Command::Recost(args) => commands::costing::recost(&ctx, &args).await,
        Command::Purge(args) => commands::costing::purge(&ctx, &args).await,
        Command::Propose(args) => commands::adjustment::propose(&ctx, &args).await,
        Command::Adjust(args) => commands::adjustment::adjust(&ctx, args).await,
        Command::DeleteAdjustment(args) => commands::adjustment::delete(&ctx, &args).await,
        Command::Review(args) => commands::adjustment::review(&ctx, &args).await,
        Command::Check(args) => commands::report::check(&ctx, &args).await,
        Command::CheckCompany(args) => commands::report::check_company(&ctx, &args).await,
        Command::Statement(args) => commands::report::statement(&ctx, &args).await,
        Command::Ledger(args) => commands::report::ledger(&ctx, &args).await,
        Command::Trail(args) => commands::report::trail(&ctx, &args).await,
        Command::Balance(args) => commands::report::balance(&ctx, &args).await,
    }
}

/// Recovers the application error behind an `anyhow` chain.
fn classify(err: anyhow::Error) -> AppError {
    match err.downcast::<AppError>() {
        Ok(app) => app,
        Err(err) => match err.downcast::<CostingError>() {
            Ok(costing) => costing.into(),
            Err(other) => AppError::Internal(format!("{other:#}")),
        },
    }
}
