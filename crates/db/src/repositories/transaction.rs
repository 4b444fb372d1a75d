//! Transaction source: the per-group stream of security transactions.
//!
//! Public methods run on the pooled connection. The `*_in` functions take any
//! connection and are used by services inside their unit of work.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use kardex_core::kardex::{
    AccountingEffect, AdjustmentClass, GroupKey, MovementKind, Transaction,
};
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId, TransactionId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::transactions;
use crate::error::CostingError;

/// Input for recording a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owning group.
    pub group: GroupKey,
    /// Transaction date.
    pub date: NaiveDate,
    /// Movement kind.
    pub movement_kind: MovementKind,
    /// Accounting effect; defaults to the movement kind's effect.
    pub effect: Option<AccountingEffect>,
    /// Unsigned quantity.
    pub quantity: Decimal,
    /// Unit price, if priced.
    pub price: Option<Decimal>,
    /// Adjustment class, adjustments only.
    pub adjustment_class: Option<AdjustmentClass>,
    /// Excluded from costing by policy.
    pub ignored_in_costing: bool,
    /// Free-form note.
    pub note: Option<String>,
}

impl NewTransaction {
    /// A plain priced or unpriced movement using the kind's default effect.
    #[must_use]
    pub fn movement(
        group: GroupKey,
        date: NaiveDate,
        movement_kind: MovementKind,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            group,
            date,
            movement_kind,
            effect: None,
            quantity,
            price,
            adjustment_class: None,
            ignored_in_costing: false,
            note: None,
        }
    }
}

/// Transaction repository for the transaction source.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the id does not resolve.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, CostingError> {
        find_in(&self.db, id).await
    }

    /// Lists the group's transactions ordered by date, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_group(&self, group: &GroupKey) -> Result<Vec<Transaction>, CostingError> {
        list_by_group_in(&self.db, group).await
    }

    /// Records a new, uncosted transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn save(&self, input: NewTransaction) -> Result<Transaction, CostingError> {
        insert_in(&self.db, input).await
    }

    /// Deletes the group's transactions dated strictly after `date`.
    ///
    /// Derived rows are not touched; use the costing service's purge to keep
    /// the kardex consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_where_date_after(
        &self,
        group: &GroupKey,
        date: NaiveDate,
    ) -> Result<u64, CostingError> {
        delete_after_in(&self.db, group, date).await
    }

    /// Groups with at least one transaction still to be costed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_groups(&self) -> Result<Vec<GroupKey>, CostingError> {
        let rows: Vec<(Uuid, Uuid, Uuid, String)> = transactions::Entity::find()
            .filter(transactions::Column::Costed.eq(false))
            .filter(transactions::Column::IgnoredInCosting.eq(false))
            .select_only()
            .column(transactions::Column::CompanyId)
            .column(transactions::Column::CustodianId)
            .column(transactions::Column::InstrumentId)
            .column(transactions::Column::Account)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        let groups: BTreeSet<GroupKey> = rows.into_iter().map(group_from_columns).collect();
        Ok(groups.into_iter().collect())
    }

    /// Transactions currently flagged for review in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_needing_review(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<Transaction>, CostingError> {
        let rows = transactions::Entity::find()
            .filter(in_group(group))
            .filter(transactions::Column::NeedsReview.eq(true))
            .order_by_asc(transactions::Column::TransactionDate)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        rows.into_iter().map(to_domain).collect()
    }
}

pub(crate) fn in_group(group: &GroupKey) -> Condition {
    Condition::all()
        .add(transactions::Column::CompanyId.eq(group.company_id.into_inner()))
        .add(transactions::Column::CustodianId.eq(group.custodian_id.into_inner()))
        .add(transactions::Column::InstrumentId.eq(group.instrument_id.into_inner()))
        .add(transactions::Column::Account.eq(group.account.as_str()))
}

fn group_from_columns((company, custodian, instrument, account): (Uuid, Uuid, Uuid, String)) -> GroupKey {
    GroupKey::new(
        CompanyId::from_uuid(company),
        CustodianId::from_uuid(custodian),
        InstrumentId::from_uuid(instrument),
        account,
    )
}

pub(crate) async fn find_in<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<Transaction, CostingError> {
    let row = transactions::Entity::find_by_id(id.value())
        .one(conn)
        .await?
        .ok_or(CostingError::TransactionNotFound(id))?;
    to_domain(row)
}

pub(crate) async fn list_by_group_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<Vec<Transaction>, CostingError> {
    let rows = transactions::Entity::find()
        .filter(in_group(group))
        .order_by_asc(transactions::Column::TransactionDate)
        .order_by_asc(transactions::Column::Id)
        .all(conn)
        .await?;
    rows.into_iter().map(to_domain).collect()
}

pub(crate) async fn group_exists_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
) -> Result<bool, CostingError> {
    let count = transactions::Entity::find()
        .filter(in_group(group))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub(crate) async fn insert_in<C: ConnectionTrait>(
    conn: &C,
    input: NewTransaction,
) -> Result<Transaction, CostingError> {
    let effect = input.effect.unwrap_or_else(|| input.movement_kind.default_effect());
    let model = transactions::ActiveModel {
        company_id: Set(input.group.company_id.into_inner()),
        custodian_id: Set(input.group.custodian_id.into_inner()),
        instrument_id: Set(input.group.instrument_id.into_inner()),
        account: Set(input.group.account.clone()),
        transaction_date: Set(input.date),
        movement_kind: Set(input.movement_kind.as_str().to_string()),
        accounting_effect: Set(effect.as_str().to_string()),
        quantity: Set(input.quantity),
        price: Set(input.price),
        adjustment_class: Set(input.adjustment_class.map(|c| c.as_str().to_string())),
        costed: Set(false),
        needs_review: Set(false),
        ignored_in_costing: Set(input.ignored_in_costing),
        note: Set(input.note),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    to_domain(model)
}

pub(crate) async fn delete_in<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<(), CostingError> {
    transactions::Entity::delete_by_id(id.value())
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn delete_after_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
    date: NaiveDate,
) -> Result<u64, CostingError> {
    let result = transactions::Entity::delete_many()
        .filter(in_group(group))
        .filter(transactions::Column::TransactionDate.gt(date))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Clears `costed` and `needs_review` from `from` onwards, leaving ignored rows alone.
pub(crate) async fn clear_flags_from_in<C: ConnectionTrait>(
    conn: &C,
    group: &GroupKey,
    from: NaiveDate,
) -> Result<u64, CostingError> {
    let result = transactions::Entity::update_many()
        .col_expr(transactions::Column::Costed, Expr::value(false))
        .col_expr(transactions::Column::NeedsReview, Expr::value(false))
        .filter(in_group(group))
        .filter(transactions::Column::TransactionDate.gte(from))
        .filter(transactions::Column::IgnoredInCosting.eq(false))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Ids per `IN (...)` update, well under the bind-parameter limits.
const UPDATE_CHUNK: usize = 1000;

/// Marks transactions costed and sets their review flag.
pub(crate) async fn mark_costed_in<C: ConnectionTrait>(
    conn: &C,
    covered: &[i64],
    flagged: &[i64],
) -> Result<(), CostingError> {
    for (ids, needs_review) in [(covered, false), (flagged, true)] {
        for chunk in ids.chunks(UPDATE_CHUNK) {
            transactions::Entity::update_many()
                .col_expr(transactions::Column::Costed, Expr::value(true))
                .col_expr(transactions::Column::NeedsReview, Expr::value(needs_review))
                .filter(transactions::Column::Id.is_in(chunk.iter().copied()))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

pub(crate) async fn clear_review_in<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<(), CostingError> {
    transactions::Entity::update_many()
        .col_expr(transactions::Column::NeedsReview, Expr::value(false))
        .filter(transactions::Column::Id.eq(id.value()))
        .exec(conn)
        .await?;
    Ok(())
}

fn to_domain(row: transactions::Model) -> Result<Transaction, CostingError> {
    const TABLE: &str = "transactions";

    let movement_kind: MovementKind = row
        .movement_kind
        .parse()
        .map_err(|_| CostingError::corrupt(TABLE, "movement_kind", &row.movement_kind))?;
    let effect: AccountingEffect = row
        .accounting_effect
        .parse()
        .map_err(|_| CostingError::corrupt(TABLE, "accounting_effect", &row.accounting_effect))?;
    let adjustment_class = row
        .adjustment_class
        .as_deref()
        .map(str::parse::<AdjustmentClass>)
        .transpose()
        .map_err(|err| CostingError::corrupt(TABLE, "adjustment_class", err.value))?;

    Ok(Transaction {
        id: TransactionId(row.id),
        group: group_from_columns((
            row.company_id,
            row.custodian_id,
            row.instrument_id,
            row.account,
        )),
        date: row.transaction_date,
        movement_kind,
        effect,
        quantity: row.quantity,
        price: row.price,
        adjustment_class,
        costed: row.costed,
        needs_review: row.needs_review,
        ignored_in_costing: row.ignored_in_costing,
        note: row.note,
    })
}
