//! `SeaORM` Entity for inventory_movements table.
//!
//! Append-only audit trail; the stock row's on_hand equals the running
//! signed sum of this ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::InventoryMovementKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub occurred_at: DateTimeWithTimeZone,
    pub unit_id: Uuid,
    pub kind: InventoryMovementKind,
    /// Signed: positive into stock, negative out of stock.
    pub quantity: i32,
    /// Cost charged or received; frozen at movement time.
    pub unit_cost: Option<Decimal>,
    pub document_ref: Option<String>,
    /// Free-form note, e.g. an adjustment reason.
    pub memo: Option<String>,
    pub performed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::units::Entity",
        from = "Column::UnitId",
        to = "super::units::Column::Id"
    )]
    Units,
}

impl Related<super::units::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
