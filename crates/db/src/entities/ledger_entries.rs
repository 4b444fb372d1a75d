//! `SeaORM` Entity for the kardex rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub transaction_id: i64,
    pub company_id: Uuid,
    pub custodian_id: Uuid,
    pub instrument_id: Uuid,
    pub account: String,
    pub entry_date: Date,
    pub movement_kind: String,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub inflow_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub inflow_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub outflow_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub outflow_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub balance_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub balance_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub average_unit_cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
