//! Adjustment proposals, creation, deletion and the review queue.

use chrono::NaiveDate;
use clap::Args;
use kardex_core::kardex::{AdjustmentClass, AdjustmentDirection, Transaction};
use kardex_db::{CreateAdjustment, TransactionRepository};
use kardex_shared::types::TransactionId;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use super::costing::pass_json;
use super::{Context, GroupArgs, print_json};

#[derive(Args)]
pub struct ProposeArgs {
    /// Reference transaction id
    #[arg(long)]
    pub transaction: i64,

    /// inject or remove
    #[arg(long, default_value = "inject")]
    pub direction: AdjustmentDirection,
}

#[derive(Args)]
pub struct AdjustArgs {
    /// Reference transaction id
    #[arg(long)]
    pub transaction: i64,

    /// inject or remove
    #[arg(long)]
    pub direction: AdjustmentDirection,

    /// Unsigned quantity
    #[arg(long)]
    pub quantity: Decimal,

    /// Unit price; unpriced injections enter at zero cost
    #[arg(long)]
    pub price: Option<Decimal>,

    /// standard, opening_balance or reconciliation_close
    #[arg(long, default_value = "standard")]
    pub class: AdjustmentClass,

    /// Date override (YYYY-MM-DD); defaults to the reference's date
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Free-form note
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Adjustment transaction id
    #[arg(long)]
    pub transaction: i64,

    /// Recost cutoff for critical adjustments (YYYY-MM-DD)
    #[arg(long)]
    pub cutoff: Option<NaiveDate>,
}

pub async fn propose(ctx: &Context, args: &ProposeArgs) -> anyhow::Result<()> {
    let proposal = ctx
        .services
        .adjustments
        .propose(TransactionId(args.transaction), args.direction)
        .await?;
    print_json(&proposal)
}

pub async fn adjust(ctx: &Context, args: AdjustArgs) -> anyhow::Result<()> {
    let mut input = CreateAdjustment::new(
        TransactionId(args.transaction),
        args.direction,
        args.quantity,
        args.price,
    );
    input.class = args.class;
    input.effective_date = args.date;
    input.note = args.note;

    let created = ctx.services.adjustments.create(input).await?;
    print_json(&created)
}

pub async fn delete(ctx: &Context, args: &DeleteArgs) -> anyhow::Result<()> {
    let outcome = ctx
        .services
        .adjustments
        .delete(TransactionId(args.transaction), args.cutoff)
        .await?;
    print_json(&json!({
        "transaction_id": outcome.transaction_id.value(),
        "group": outcome.group.to_string(),
        "entries_deleted": outcome.deleted.entries,
        "consumptions_deleted": outcome.deleted.consumptions,
        "recost": outcome.recost.as_ref().map(pass_json),
        "balance": outcome.balance,
    }))
}

pub async fn review(ctx: &Context, args: &GroupArgs) -> anyhow::Result<()> {
    let flagged = TransactionRepository::new(ctx.db.clone())
        .list_needing_review(&args.key())
        .await?;
    let rows: Vec<Value> = flagged.iter().map(review_row).collect();
    print_json(&rows)
}

fn review_row(tx: &Transaction) -> Value {
    json!({
        "id": tx.id.value(),
        "date": tx.date,
        "movement_kind": tx.movement_kind.as_str(),
        "quantity": tx.quantity,
        "price": tx.price,
        "note": tx.note,
    })
}
