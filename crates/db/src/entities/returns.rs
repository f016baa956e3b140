//! `SeaORM` Entity for returns table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{DocumentStatus, ReturnKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub occurred_at: DateTimeWithTimeZone,
    pub kind: ReturnKind,
    pub client_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// Set when settled immediately; cash methods move the register.
    pub payment_method_id: Option<Uuid>,
    pub status: DocumentStatus,
    pub total: Decimal,
    pub performed_by: Option<Uuid>,
    pub voided_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::return_lines::Entity")]
    ReturnLines,
}

impl Related<super::return_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReturnLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
