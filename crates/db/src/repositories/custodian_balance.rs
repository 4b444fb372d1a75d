//! Custodian statement balances, the external side of consistency checks.

use std::collections::BTreeSet;

use kardex_core::kardex::{ExternalBalance, GroupKey};
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::custodian_balances;
use crate::error::CostingError;

/// Access to custodian statement lines.
#[derive(Debug, Clone)]
pub struct CustodianBalanceRepository {
    db: DatabaseConnection,
}

impl CustodianBalanceRepository {
    /// Creates a new custodian balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a statement line.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a duplicate
    /// (group, statement date).
    pub async fn record(&self, statement: &ExternalBalance) -> Result<(), CostingError> {
        custodian_balances::ActiveModel {
            company_id: Set(statement.group.company_id.into_inner()),
            custodian_id: Set(statement.group.custodian_id.into_inner()),
            instrument_id: Set(statement.group.instrument_id.into_inner()),
            account: Set(statement.group.account.clone()),
            statement_date: Set(statement.statement_date),
            quantity: Set(statement.quantity),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// The most recent statement line of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest(&self, group: &GroupKey) -> Result<Option<ExternalBalance>, CostingError> {
        latest_in(&self.db, group).await
    }

    /// Groups of a company that have at least one statement line.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn groups_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<GroupKey>, CostingError> {
        let rows: Vec<(Uuid, Uuid, Uuid, String)> = custodian_balances::Entity::find()
            .filter(custodian_balances::Column::CompanyId.eq(company_id.into_inner()))
            .select_only()
            .column(custodian_balances::Column::CompanyId)
            .column(custodian_balances::Column::CustodianId)
            .column(custodian_balances::Column::InstrumentId)
            .column(custodian_balances::Column::Account)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        let groups: BTreeSet<GroupKey> = rows
            .into_iter()
            .map(|(company, custodian, instrument, account)| {
                GroupKey::new(
                    CompanyId::from_uuid(company),
                    CustodianId::from_uuid(custodian),
                    InstrumentId::from_uuid(instrument),
                    account,
                )
            })
            .collect();
        Ok(groups.into_iter().collect())
    }
}

pub(crate) async fn latest_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<Option<ExternalBalance>, CostingError> {
    let row = custodian_balances::Entity::find()
        .filter(
            Condition::all()
                .add(custodian_balances::Column::CompanyId.eq(group.company_id.into_inner()))
                .add(custodian_balances::Column::CustodianId.eq(group.custodian_id.into_inner()))
                .add(custodian_balances::Column::InstrumentId.eq(group.instrument_id.into_inner()))
                .add(custodian_balances::Column::Account.eq(group.account.as_str())),
        )
        .order_by_desc(custodian_balances::Column::StatementDate)
        .one(conn)
        .await?;

    Ok(row.map(|row| ExternalBalance {
        group: group.clone(),
        statement_date: row.statement_date,
        quantity: row.quantity,
    }))
}
