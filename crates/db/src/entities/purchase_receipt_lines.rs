//! `SeaORM` Entity for purchase_receipt_lines table.
//!
//! `unit_cost` is the caller-supplied cost frozen at receipt time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_receipt_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub unit_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_receipts::Entity",
        from = "Column::ReceiptId",
        to = "super::purchase_receipts::Column::Id"
    )]
    PurchaseReceipts,
    #[sea_orm(
        belongs_to = "super::units::Entity",
        from = "Column::UnitId",
        to = "super::units::Column::Id"
    )]
    Units,
}

impl Related<super::purchase_receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseReceipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
