//! Costing schema: transactions, kardex rows, consumption trail, balance cache.

use sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Fixed-point column. SQLite caps declared precision at 16 digits, so it
/// gets an unbounded decimal instead of `numeric(28, 10)`.
pub(super) fn decimal(backend: DatabaseBackend, col: impl IntoIden) -> ColumnDef {
    let mut def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Sqlite => def.decimal(),
        _ => def.decimal_len(28, 10),
    };
    def
}

fn money(backend: DatabaseBackend, col: impl IntoIden) -> ColumnDef {
    decimal(backend, col).not_null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::CustodianId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::InstrumentId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::Account).string_len(64).not_null())
                    .col(ColumnDef::new(Transactions::TransactionDate).date().not_null())
                    .col(ColumnDef::new(Transactions::MovementKind).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Transactions::AccountingEffect)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(money(backend, Transactions::Quantity))
                    .col(decimal(backend, Transactions::Price).null())
                    .col(ColumnDef::new(Transactions::AdjustmentClass).string_len(32).null())
                    .col(
                        ColumnDef::new(Transactions::Costed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Transactions::NeedsReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Transactions::IgnoredInCosting)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::Note).text().null())
                    .to_owned(),
            )
            .await?;

        // FIFO stream scan: group, then (date, id)
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_group_date")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::CustodianId)
                    .col(Transactions::InstrumentId)
                    .col(Transactions::Account)
                    .col(Transactions::TransactionDate)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::TransactionId).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::CustodianId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::InstrumentId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::Account).string_len(64).not_null())
                    .col(ColumnDef::new(LedgerEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(LedgerEntries::MovementKind).string_len(32).not_null())
                    .col(money(backend, LedgerEntries::InflowQuantity))
                    .col(money(backend, LedgerEntries::InflowCost))
                    .col(money(backend, LedgerEntries::OutflowQuantity))
                    .col(money(backend, LedgerEntries::OutflowCost))
                    .col(money(backend, LedgerEntries::BalanceQuantity))
                    .col(money(backend, LedgerEntries::BalanceValue))
                    .col(money(backend, LedgerEntries::AverageUnitCost))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_transaction")
                            .from(LedgerEntries::Table, LedgerEntries::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_group_date")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::CompanyId)
                    .col(LedgerEntries::CustodianId)
                    .col(LedgerEntries::InstrumentId)
                    .col(LedgerEntries::Account)
                    .col(LedgerEntries::EntryDate)
                    .col(LedgerEntries::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConsumptionDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsumptionDetails::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionDetails::OutflowTransactionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionDetails::InflowTransactionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConsumptionDetails::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ConsumptionDetails::CustodianId).uuid().not_null())
                    .col(ColumnDef::new(ConsumptionDetails::InstrumentId).uuid().not_null())
                    .col(ColumnDef::new(ConsumptionDetails::Account).string_len(64).not_null())
                    .col(ColumnDef::new(ConsumptionDetails::OutflowDate).date().not_null())
                    .col(ColumnDef::new(ConsumptionDetails::InflowDate).date().not_null())
                    .col(ColumnDef::new(ConsumptionDetails::Sequence).big_integer().not_null())
                    .col(money(backend, ConsumptionDetails::Quantity))
                    .col(money(backend, ConsumptionDetails::UnitCost))
                    .col(money(backend, ConsumptionDetails::Cost))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consumption_details_outflow")
                            .from(
                                ConsumptionDetails::Table,
                                ConsumptionDetails::OutflowTransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consumption_details_inflow")
                            .from(
                                ConsumptionDetails::Table,
                                ConsumptionDetails::InflowTransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consumption_details_outflow")
                    .table(ConsumptionDetails::Table)
                    .col(ConsumptionDetails::OutflowTransactionId)
                    .col(ConsumptionDetails::Sequence)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consumption_details_inflow")
                    .table(ConsumptionDetails::Table)
                    .col(ConsumptionDetails::InflowTransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConsolidatedBalances::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ConsolidatedBalances::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ConsolidatedBalances::CustodianId).uuid().not_null())
                    .col(ColumnDef::new(ConsolidatedBalances::InstrumentId).uuid().not_null())
                    .col(
                        ColumnDef::new(ConsolidatedBalances::Account)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(money(backend, ConsolidatedBalances::Quantity))
                    .col(money(backend, ConsolidatedBalances::TotalCost))
                    .col(money(backend, ConsolidatedBalances::AverageUnitCost))
                    .col(ColumnDef::new(ConsolidatedBalances::AsOfDate).date().null())
                    .primary_key(
                        Index::create()
                            .col(ConsolidatedBalances::CompanyId)
                            .col(ConsolidatedBalances::CustodianId)
                            .col(ConsolidatedBalances::InstrumentId)
                            .col(ConsolidatedBalances::Account),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConsolidatedBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ConsumptionDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    CompanyId,
    CustodianId,
    InstrumentId,
    Account,
    TransactionDate,
    MovementKind,
    AccountingEffect,
    Quantity,
    Price,
    AdjustmentClass,
    Costed,
    NeedsReview,
    IgnoredInCosting,
    Note,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    TransactionId,
    CompanyId,
    CustodianId,
    InstrumentId,
    Account,
    EntryDate,
    MovementKind,
    InflowQuantity,
    InflowCost,
    OutflowQuantity,
    OutflowCost,
    BalanceQuantity,
    BalanceValue,
    AverageUnitCost,
}

#[derive(DeriveIden)]
enum ConsumptionDetails {
    Table,
    Id,
    OutflowTransactionId,
    InflowTransactionId,
    CompanyId,
    CustodianId,
    InstrumentId,
    Account,
    OutflowDate,
    InflowDate,
    Sequence,
    Quantity,
    UnitCost,
    Cost,
}

#[derive(DeriveIden)]
enum ConsolidatedBalances {
    Table,
    CompanyId,
    CustodianId,
    InstrumentId,
    Account,
    Quantity,
    TotalCost,
    AverageUnitCost,
    AsOfDate,
}
