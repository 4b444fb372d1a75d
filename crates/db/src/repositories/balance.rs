//! Consolidated balance cache storage.
//!
//! `refresh_in` is the only write path: it mirrors the group's last kardex row,
//! or zeros when the kardex is empty.

use kardex_core::kardex::{ConsolidatedBalance, GroupKey};
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::consolidated_balances;
use crate::error::CostingError;
use crate::repositories::ledger;

/// Read access to consolidated balances.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The cached balance of a group, if it was ever costed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_group(
        &self,
        group: &GroupKey,
    ) -> Result<Option<ConsolidatedBalance>, CostingError> {
        find_in(&self.db, group).await
    }

    /// Every cached balance of a company, ordered by custodian, instrument, account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ConsolidatedBalance>, CostingError> {
        let rows = consolidated_balances::Entity::find()
            .filter(consolidated_balances::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(consolidated_balances::Column::CustodianId)
            .order_by_asc(consolidated_balances::Column::InstrumentId)
            .order_by_asc(consolidated_balances::Column::Account)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }
}

pub(crate) async fn find_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<Option<ConsolidatedBalance>, CostingError> {
    let row = consolidated_balances::Entity::find_by_id((
        group.company_id.into_inner(),
        group.custodian_id.into_inner(),
        group.instrument_id.into_inner(),
        group.account.clone(),
    ))
    .one(conn)
    .await?;
    Ok(row.map(to_domain))
}

/// Rederives the group's snapshot from its last kardex row and upserts it.
pub(crate) async fn refresh_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<ConsolidatedBalance, CostingError> {
    let last = ledger::last_entry_in(conn, group).await?;
    let snapshot = ConsolidatedBalance::from_last_entry(group.clone(), last.as_ref());

    let model = consolidated_balances::ActiveModel {
        company_id: Set(group.company_id.into_inner()),
        custodian_id: Set(group.custodian_id.into_inner()),
        instrument_id: Set(group.instrument_id.into_inner()),
        account: Set(group.account.clone()),
        quantity: Set(snapshot.quantity),
        total_cost: Set(snapshot.total_cost),
        average_unit_cost: Set(snapshot.average_unit_cost),
        as_of_date: Set(snapshot.as_of_date),
    };

    consolidated_balances::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                consolidated_balances::Column::CompanyId,
                consolidated_balances::Column::CustodianId,
                consolidated_balances::Column::InstrumentId,
                consolidated_balances::Column::Account,
            ])
            .update_columns([
                consolidated_balances::Column::Quantity,
                consolidated_balances::Column::TotalCost,
                consolidated_balances::Column::AverageUnitCost,
                consolidated_balances::Column::AsOfDate,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(snapshot)
}

fn to_domain(row: consolidated_balances::Model) -> ConsolidatedBalance {
    ConsolidatedBalance {
        group: GroupKey::new(
            CompanyId::from_uuid(row.company_id),
            CustodianId::from_uuid(row.custodian_id),
            InstrumentId::from_uuid(row.instrument_id),
            row.account,
        ),
        quantity: row.quantity,
        total_cost: row.total_cost,
        average_unit_cost: row.average_unit_cost,
        as_of_date: row.as_of_date,
    }
}
