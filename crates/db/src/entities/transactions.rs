//! `SeaORM` Entity for the transactions table (the transaction source).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: Uuid,
    pub custodian_id: Uuid,
    pub instrument_id: Uuid,
    pub account: String,
    pub transaction_date: Date,
    pub movement_kind: String,
    pub accounting_effect: String,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))", nullable)]
    pub price: Option<Decimal>,
    pub adjustment_class: Option<String>,
    pub costed: bool,
    pub needs_review: bool,
    pub ignored_in_costing: bool,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
