//! Kardex rows and FIFO consumption trail storage.
//!
//! Rows are always read in (date, transaction id) order, the same order the
//! engine produced them in.

use chrono::NaiveDate;
use kardex_core::kardex::{ConsumptionDetail, GroupKey, KardexEntry, MovementKind, Transaction};
use kardex_shared::types::{
    CompanyId, CustodianId, InstrumentId, PageRequest, PageResponse, TransactionId,
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{consumption_details, ledger_entries};
use crate::error::CostingError;

/// Rows per multi-row insert, well under the bind-parameter limits.
const INSERT_CHUNK: usize = 500;

/// Read access to the kardex and its consumption trail.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

/// Counts of derived rows removed by a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedRows {
    /// Kardex rows removed.
    pub entries: u64,
    /// Consumption trail rows removed.
    pub consumptions: u64,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a page of the group's kardex.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_group(
        &self,
        group: &GroupKey,
        page: &PageRequest,
    ) -> Result<PageResponse<KardexEntry>, CostingError> {
        let total = ledger_entries::Entity::find()
            .filter(entries_in_group(group))
            .count(&self.db)
            .await?;

        let rows = ordered_entries()
            .filter(entries_in_group(group))
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        let data = rows
            .into_iter()
            .map(entry_to_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Lists the group's kardex between two dates, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_date_range(
        &self,
        group: &GroupKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KardexEntry>, CostingError> {
        let rows = ordered_entries()
            .filter(entries_in_group(group))
            .filter(ledger_entries::Column::EntryDate.between(from, to))
            .all(&self.db)
            .await?;
        rows.into_iter().map(entry_to_domain).collect()
    }

    /// Lists the full kardex of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self, group: &GroupKey) -> Result<Vec<KardexEntry>, CostingError> {
        list_entries_in(&self.db, group).await
    }

    /// The FIFO trail explaining one outflow's cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn consumption_trail(
        &self,
        outflow: TransactionId,
    ) -> Result<Vec<ConsumptionDetail>, CostingError> {
        let rows = consumption_details::Entity::find()
            .filter(consumption_details::Column::OutflowTransactionId.eq(outflow.value()))
            .order_by_asc(consumption_details::Column::Sequence)
            .all(&self.db)
            .await?;
        rows.into_iter().map(consumption_to_domain).collect()
    }

    /// Lists the group's full consumption trail.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_consumptions(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<ConsumptionDetail>, CostingError> {
        let rows = consumption_details::Entity::find()
            .filter(consumptions_in_group(group))
            .order_by_asc(consumption_details::Column::OutflowDate)
            .order_by_asc(consumption_details::Column::OutflowTransactionId)
            .order_by_asc(consumption_details::Column::Sequence)
            .all(&self.db)
            .await?;
        rows.into_iter().map(consumption_to_domain).collect()
    }

    /// The running balance as of the row preceding `transaction`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entry_before(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<KardexEntry>, CostingError> {
        entry_before_in(&self.db, transaction).await
    }
}

fn ordered_entries() -> sea_orm::Select<ledger_entries::Entity> {
    ledger_entries::Entity::find()
        .order_by_asc(ledger_entries::Column::EntryDate)
        .order_by_asc(ledger_entries::Column::TransactionId)
}

fn entries_in_group(group: &GroupKey) -> Condition {
    Condition::all()
        .add(ledger_entries::Column::CompanyId.eq(group.company_id.into_inner()))
        .add(ledger_entries::Column::CustodianId.eq(group.custodian_id.into_inner()))
        .add(ledger_entries::Column::InstrumentId.eq(group.instrument_id.into_inner()))
        .add(ledger_entries::Column::Account.eq(group.account.as_str()))
}

fn consumptions_in_group(group: &GroupKey) -> Condition {
    Condition::all()
        .add(consumption_details::Column::CompanyId.eq(group.company_id.into_inner()))
        .add(consumption_details::Column::CustodianId.eq(group.custodian_id.into_inner()))
        .add(consumption_details::Column::InstrumentId.eq(group.instrument_id.into_inner()))
        .add(consumption_details::Column::Account.eq(group.account.as_str()))
}

pub(crate) async fn list_entries_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<Vec<KardexEntry>, CostingError> {
    let rows = ordered_entries()
        .filter(entries_in_group(group))
        .all(conn)
        .await?;
    rows.into_iter().map(entry_to_domain).collect()
}

pub(crate) async fn last_entry_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<Option<KardexEntry>, CostingError> {
    let row = ledger_entries::Entity::find()
        .filter(entries_in_group(group))
        .order_by_desc(ledger_entries::Column::EntryDate)
        .order_by_desc(ledger_entries::Column::TransactionId)
        .one(conn)
        .await?;
    row.map(entry_to_domain).transpose()
}

pub(crate) async fn last_entry_on_or_before_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
    date: NaiveDate,
) -> Result<Option<KardexEntry>, CostingError> {
    let row = ledger_entries::Entity::find()
        .filter(entries_in_group(group))
        .filter(ledger_entries::Column::EntryDate.lte(date))
        .order_by_desc(ledger_entries::Column::EntryDate)
        .order_by_desc(ledger_entries::Column::TransactionId)
        .one(conn)
        .await?;
    row.map(entry_to_domain).transpose()
}

/// The row immediately preceding `transaction` in (date, id) order.
pub(crate) async fn entry_before_in<C: ConnectionTrait>(
    conn: &C,
    transaction: &Transaction,
) -> Result<Option<KardexEntry>, CostingError> {
    let earlier = Condition::any()
        .add(ledger_entries::Column::EntryDate.lt(transaction.date))
        .add(
            Condition::all()
                .add(ledger_entries::Column::EntryDate.eq(transaction.date))
                .add(ledger_entries::Column::TransactionId.lt(transaction.id.value())),
        );

    let row = ledger_entries::Entity::find()
        .filter(entries_in_group(&transaction.group))
        .filter(earlier)
        .order_by_desc(ledger_entries::Column::EntryDate)
        .order_by_desc(ledger_entries::Column::TransactionId)
        .one(conn)
        .await?;
    row.map(entry_to_domain).transpose()
}

pub(crate) async fn insert_entries_in<'a, C, I>(conn: &C, entries: I) -> Result<u64, CostingError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = &'a KardexEntry>,
{
    let models: Vec<ledger_entries::ActiveModel> = entries.into_iter().map(entry_model).collect();
    let mut written = 0;
    for chunk in models.chunks(INSERT_CHUNK) {
        written += ledger_entries::Entity::insert_many(chunk.to_vec())
            .exec_without_returning(conn)
            .await?;
    }
    Ok(written)
}

pub(crate) async fn insert_consumptions_in<'a, C, I>(
    conn: &C,
    details: I,
) -> Result<u64, CostingError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = &'a ConsumptionDetail>,
{
    let models: Vec<consumption_details::ActiveModel> =
        details.into_iter().map(consumption_model).collect();
    let mut written = 0;
    for chunk in models.chunks(INSERT_CHUNK) {
        written += consumption_details::Entity::insert_many(chunk.to_vec())
            .exec_without_returning(conn)
            .await?;
    }
    Ok(written)
}

/// Deletes kardex rows dated on or after `from`, and the trail of outflows
/// dated on or after `from`.
pub(crate) async fn delete_from_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
    from: NaiveDate,
) -> Result<DeletedRows, CostingError> {
    let consumptions = consumption_details::Entity::delete_many()
        .filter(consumptions_in_group(group))
        .filter(consumption_details::Column::OutflowDate.gte(from))
        .exec(conn)
        .await?
        .rows_affected;
    let entries = ledger_entries::Entity::delete_many()
        .filter(entries_in_group(group))
        .filter(ledger_entries::Column::EntryDate.gte(from))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(DeletedRows {
        entries,
        consumptions,
    })
}

/// Deletes the kardex row of one transaction and every trail row naming it,
/// as the consuming outflow or as the consumed lot.
pub(crate) async fn delete_for_transaction_in<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<DeletedRows, CostingError> {
    let consumptions = consumption_details::Entity::delete_many()
        .filter(
            Condition::any()
                .add(consumption_details::Column::OutflowTransactionId.eq(id.value()))
                .add(consumption_details::Column::InflowTransactionId.eq(id.value())),
        )
        .exec(conn)
        .await?
        .rows_affected;
    let entries = ledger_entries::Entity::delete_many()
        .filter(ledger_entries::Column::TransactionId.eq(id.value()))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(DeletedRows {
        entries,
        consumptions,
    })
}

fn entry_model(entry: &KardexEntry) -> ledger_entries::ActiveModel {
    ledger_entries::ActiveModel {
        transaction_id: Set(entry.transaction_id.value()),
        company_id: Set(entry.group.company_id.into_inner()),
        custodian_id: Set(entry.group.custodian_id.into_inner()),
        instrument_id: Set(entry.group.instrument_id.into_inner()),
        account: Set(entry.group.account.clone()),
        entry_date: Set(entry.date),
        movement_kind: Set(entry.movement_kind.as_str().to_string()),
        inflow_quantity: Set(entry.inflow_quantity),
        inflow_cost: Set(entry.inflow_cost),
        outflow_quantity: Set(entry.outflow_quantity),
        outflow_cost: Set(entry.outflow_cost),
        balance_quantity: Set(entry.balance_quantity),
        balance_value: Set(entry.balance_value),
        average_unit_cost: Set(entry.average_unit_cost),
        ..Default::default()
    }
}

fn consumption_model(detail: &ConsumptionDetail) -> consumption_details::ActiveModel {
    consumption_details::ActiveModel {
        outflow_transaction_id: Set(detail.outflow_transaction_id.value()),
        inflow_transaction_id: Set(detail.inflow_transaction_id.value()),
        company_id: Set(detail.group.company_id.into_inner()),
        custodian_id: Set(detail.group.custodian_id.into_inner()),
        instrument_id: Set(detail.group.instrument_id.into_inner()),
        account: Set(detail.group.account.clone()),
        outflow_date: Set(detail.outflow_date),
        inflow_date: Set(detail.inflow_date),
        sequence: Set(i64::from(detail.sequence)),
        quantity: Set(detail.quantity),
        unit_cost: Set(detail.unit_cost),
        cost: Set(detail.cost),
        ..Default::default()
    }
}

fn entry_to_domain(row: ledger_entries::Model) -> Result<KardexEntry, CostingError> {
    let movement_kind: MovementKind = row
        .movement_kind
        .parse()
        .map_err(|_| CostingError::corrupt("ledger_entries", "movement_kind", &row.movement_kind))?;

    Ok(KardexEntry {
        transaction_id: TransactionId(row.transaction_id),
        group: GroupKey::new(
            CompanyId::from_uuid(row.company_id),
            CustodianId::from_uuid(row.custodian_id),
            InstrumentId::from_uuid(row.instrument_id),
            row.account,
        ),
        date: row.entry_date,
        movement_kind,
        inflow_quantity: row.inflow_quantity,
        inflow_cost: row.inflow_cost,
        outflow_quantity: row.outflow_quantity,
        outflow_cost: row.outflow_cost,
        balance_quantity: row.balance_quantity,
        balance_value: row.balance_value,
        average_unit_cost: row.average_unit_cost,
    })
}

fn consumption_to_domain(
    row: consumption_details::Model,
) -> Result<ConsumptionDetail, CostingError> {
    let sequence = u32::try_from(row.sequence).map_err(|_| {
        CostingError::corrupt("consumption_details", "sequence", row.sequence.to_string())
    })?;

    Ok(ConsumptionDetail {
        outflow_transaction_id: TransactionId(row.outflow_transaction_id),
        inflow_transaction_id: TransactionId(row.inflow_transaction_id),
        group: GroupKey::new(
            CompanyId::from_uuid(row.company_id),
            CustodianId::from_uuid(row.custodian_id),
            InstrumentId::from_uuid(row.instrument_id),
            row.account,
        ),
        outflow_date: row.outflow_date,
        inflow_date: row.inflow_date,
        sequence,
        quantity: row.quantity,
        unit_cost: row.unit_cost,
        cost: row.cost,
    })
}
