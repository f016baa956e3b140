//! `SeaORM` Entity for purchase_receipts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::DocumentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub occurred_at: DateTimeWithTimeZone,
    pub supplier_id: Uuid,
    /// Set when the receipt was settled immediately; cash methods also
    /// append a supplier payment to the register.
    pub payment_method_id: Option<Uuid>,
    /// Free-form reference to the supplier order being received.
    pub order_reference: Option<String>,
    pub status: DocumentStatus,
    pub total: Decimal,
    pub performed_by: Option<Uuid>,
    pub voided_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
    #[sea_orm(has_many = "super::purchase_receipt_lines::Entity")]
    PurchaseReceiptLines,
}

impl Related<super::purchase_receipt_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseReceiptLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
