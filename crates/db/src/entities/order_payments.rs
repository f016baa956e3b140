//! `SeaORM` Entity for order_payments table.
//!
//! Append-only payment event log: collections and refunds, both positive,
//! refunds optionally linked to the collection they unwind.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::PaymentEventKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "order_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub occurred_at: DateTimeWithTimeZone,
    pub kind: PaymentEventKind,
    pub amount: Decimal,
    pub payment_method_id: Uuid,
    pub reference: Option<String>,
    /// For refunds, the collection row being unwound.
    pub refund_of: Option<Uuid>,
    pub performed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_orders::Entity",
        from = "Column::OrderId",
        to = "super::customer_orders::Column::Id"
    )]
    CustomerOrders,
    #[sea_orm(
        belongs_to = "super::payment_methods::Entity",
        from = "Column::PaymentMethodId",
        to = "super::payment_methods::Column::Id"
    )]
    PaymentMethods,
}

impl Related<super::customer_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
