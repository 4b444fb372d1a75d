//! `SeaORM` Entity for custodian statement balances.
//!
//! Filled by upstream reconciliation; the costing services only read it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custodian_balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: Uuid,
    pub custodian_id: Uuid,
    pub instrument_id: Uuid,
    pub account: String,
    pub statement_date: Date,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub quantity: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
