//! `SeaORM` Entity for the FIFO consumption trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumption_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub outflow_transaction_id: i64,
    pub inflow_transaction_id: i64,
    pub company_id: Uuid,
    pub custodian_id: Uuid,
    pub instrument_id: Uuid,
    pub account: String,
    pub outflow_date: Date,
    pub inflow_date: Date,
    pub sequence: i64,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::OutflowTransactionId",
        to = "super::transactions::Column::Id"
    )]
    OutflowTransaction,
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::InflowTransactionId",
        to = "super::transactions::Column::Id"
    )]
    InflowTransaction,
}

impl ActiveModelBehavior for ActiveModel {}
