//! Batch runs, resets, recosts and purges.

use chrono::NaiveDate;
use clap::Args;
use kardex_db::services::{GroupPass, RunSummary};
use serde_json::{Value, json};

use super::{Context, GroupArgs, print_json};

#[derive(Args)]
pub struct ResetArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// First date whose derived rows are deleted (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,
}

#[derive(Args)]
pub struct RecostArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Recost from this date; the whole history when omitted
    #[arg(long)]
    pub from: Option<NaiveDate>,
}

#[derive(Args)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Transactions dated strictly after this date are deleted
    #[arg(long)]
    pub after: NaiveDate,
}

pub async fn run_all(ctx: &Context) -> anyhow::Result<()> {
    let summary = ctx.services.costing.run_all().await?;
    print_json(&summary_json(&summary))
}

pub async fn reset(ctx: &Context, args: &ResetArgs) -> anyhow::Result<()> {
    let outcome = ctx
        .services
        .costing
        .reset_group(&args.group.key(), args.from)
        .await?;
    print_json(&json!({
        "group": outcome.group.to_string(),
        "from": outcome.from,
        "entries_deleted": outcome.deleted.entries,
        "consumptions_deleted": outcome.deleted.consumptions,
        "transactions_cleared": outcome.transactions_cleared,
        "balance": outcome.balance,
    }))
}

pub async fn recost(ctx: &Context, args: &RecostArgs) -> anyhow::Result<()> {
    let pass = ctx
        .services
        .costing
        .recost_group(&args.group.key(), args.from)
        .await?;
    print_json(&pass_json(&pass))
}

pub async fn purge(ctx: &Context, args: &PurgeArgs) -> anyhow::Result<()> {
    let outcome = ctx
        .services
        .costing
        .purge_transactions_after(&args.group.key(), args.after)
        .await?;
    print_json(&json!({
        "transactions_deleted": outcome.transactions_deleted,
        "pass": pass_json(&outcome.pass),
    }))
}

pub fn pass_json(pass: &GroupPass) -> Value {
    json!({
        "group": pass.group.to_string(),
        "from": pass.from,
        "entries_written": pass.entries_written,
        "consumptions_written": pass.consumptions_written,
        "flagged": pass.flagged.iter().map(|id| id.value()).collect::<Vec<_>>(),
        "balance": pass.balance,
    })
}

fn summary_json(summary: &RunSummary) -> Value {
    let failures: Vec<Value> = summary
        .failures
        .iter()
        .map(|failure| {
            json!({
                "group": failure.group.to_string(),
                "code": failure.error.error_code(),
                "error": failure.error.to_string(),
            })
        })
        .collect();

    json!({
        "groups_processed": summary.groups_processed,
        "groups_failed": summary.groups_failed(),
        "needs_review": summary.needs_review,
        "failures": failures,
    })
}
