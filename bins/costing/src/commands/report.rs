//! Read-only queries and custodian statements.

use chrono::NaiveDate;
use clap::Args;
use kardex_core::kardex::{ConsolidatedBalance, ExternalBalance};
use kardex_db::{BalanceRepository, CustodianBalanceRepository, LedgerRepository};
use kardex_shared::types::{CompanyId, PageRequest, TransactionId};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Context, GroupArgs, print_json};

#[derive(Args)]
pub struct CompanyArgs {
    /// Company id
    #[arg(long)]
    pub company: Uuid,
}

#[derive(Args)]
pub struct StatementArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Statement date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Quantity held according to the custodian
    #[arg(long)]
    pub quantity: Decimal,
}

#[derive(Args)]
pub struct LedgerArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page
    #[arg(long, default_value_t = 50)]
    pub per_page: u32,

    /// Only rows on or after this date
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Only rows on or before this date
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

#[derive(Args)]
pub struct TrailArgs {
    /// Outflow transaction id
    #[arg(long)]
    pub transaction: i64,
}

pub async fn check(ctx: &Context, args: &GroupArgs) -> anyhow::Result<()> {
    let report = ctx.services.consistency.check(&args.key()).await?;
    print_json(&report)
}

pub async fn check_company(ctx: &Context, args: &CompanyArgs) -> anyhow::Result<()> {
    let reports = ctx
        .services
        .consistency
        .check_company(CompanyId::from_uuid(args.company))
        .await?;
    print_json(&reports)
}

pub async fn statement(ctx: &Context, args: &StatementArgs) -> anyhow::Result<()> {
    let line = ExternalBalance {
        group: args.group.key(),
        statement_date: args.date,
        quantity: args.quantity,
    };
    CustodianBalanceRepository::new(ctx.db.clone())
        .record(&line)
        .await?;
    print_json(&line)
}

pub async fn ledger(ctx: &Context, args: &LedgerArgs) -> anyhow::Result<()> {
    let ledger = LedgerRepository::new(ctx.db.clone());
    let group = args.group.key();

    if let (Some(from), Some(to)) = (args.from, args.to) {
        let rows = ledger.list_by_date_range(&group, from, to).await?;
        return print_json(&rows);
    }

    let page = ledger
        .list_by_group(&group, &PageRequest::new(args.page, args.per_page))
        .await?;
    print_json(&page)
}

pub async fn trail(ctx: &Context, args: &TrailArgs) -> anyhow::Result<()> {
    let rows = LedgerRepository::new(ctx.db.clone())
        .consumption_trail(TransactionId(args.transaction))
        .await?;
    print_json(&rows)
}

pub async fn balance(ctx: &Context, args: &GroupArgs) -> anyhow::Result<()> {
    let group = args.key();
    let snapshot = BalanceRepository::new(ctx.db.clone())
        .find_by_group(&group)
        .await?
        .unwrap_or_else(|| ConsolidatedBalance::zero(group));
    print_json(&snapshot)
}
