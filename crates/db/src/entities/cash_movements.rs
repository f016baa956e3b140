//! `SeaORM` Entity for cash_movements table.
//!
//! Append-only; rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::CashMovementKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub occurred_at: DateTimeWithTimeZone,
    pub kind: CashMovementKind,
    /// Signed only for adjustments; positive otherwise.
    pub amount: Decimal,
    pub memo: Option<String>,
    /// Number of the document that caused the movement, if any.
    pub document_ref: Option<String>,
    pub performed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::register_sessions::Entity",
        from = "Column::SessionId",
        to = "super::register_sessions::Column::Id"
    )]
    RegisterSessions,
}

impl Related<super::register_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegisterSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
