//! Custodian statement balances used by the consistency checker.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_kardex::decimal;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(CustodianBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustodianBalances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustodianBalances::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(CustodianBalances::CustodianId).uuid().not_null())
                    .col(ColumnDef::new(CustodianBalances::InstrumentId).uuid().not_null())
                    .col(ColumnDef::new(CustodianBalances::Account).string_len(64).not_null())
                    .col(ColumnDef::new(CustodianBalances::StatementDate).date().not_null())
                    .col(decimal(backend, CustodianBalances::Quantity).not_null())
                    .to_owned(),
            )
            .await?;

        // One statement line per group and date
        manager
            .create_index(
                Index::create()
                    .name("idx_custodian_balances_group_date")
                    .table(CustodianBalances::Table)
                    .col(CustodianBalances::CompanyId)
                    .col(CustodianBalances::CustodianId)
                    .col(CustodianBalances::InstrumentId)
                    .col(CustodianBalances::Account)
                    .col(CustodianBalances::StatementDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustodianBalances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CustodianBalances {
    Table,
    Id,
    CompanyId,
    CustodianId,
    InstrumentId,
    Account,
    StatementDate,
    Quantity,
}
