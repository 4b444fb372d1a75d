//! `SeaORM` Entity for the consolidated balance cache.
//!
//! One row per group; the four group columns form the primary key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consolidated_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub company_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub custodian_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub instrument_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account: String,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub average_unit_cost: Decimal,
    pub as_of_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
