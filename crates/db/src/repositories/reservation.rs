//! Reservation ledger repository.
//!
//! Reservation rows are owned by the order lifecycle: created or replaced
//! when an order enters a reservable state, deleted when it leaves one.
//! Sync always runs inside the transaction of the triggering state change,
//! so a shortfall rolls the state change back too.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use bodega_core::reservation::{plan_sync, LineDemand, ReservationError, UnitAvailability};

use crate::entities::enums::OrderStatus;
use crate::entities::{customer_orders, reservations, stock_units};

/// Order states whose reservations count against availability.
const RESERVABLE: [OrderStatus; 3] = [
    OrderStatus::Confirmed,
    OrderStatus::InPreparation,
    OrderStatus::Ready,
];

/// Errors raised by reservation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReservationLedgerError {
    /// A reservation rule was violated.
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Repository for reservation rows and availability sums.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    db: DatabaseConnection,
}

impl ReservationRepository {
    /// Creates a new reservation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Quantity of a unit held by active reservations, for display.
    ///
    /// Read-only; runs at default isolation and may be stale.
    pub async fn reserved(
        &self,
        unit_id: Uuid,
        excluding_order: Option<Uuid>,
    ) -> Result<i32, ReservationLedgerError> {
        Ok(Self::reserved_in(&self.db, unit_id, excluding_order).await?)
    }

    /// Sums active reservations for a unit on the given connection.
    ///
    /// Only orders in a reservable state count; `excluding_order` lets an
    /// order see availability with its own holds added back.
    pub async fn reserved_in<C: ConnectionTrait>(
        conn: &C,
        unit_id: Uuid,
        excluding_order: Option<Uuid>,
    ) -> Result<i32, DbErr> {
        let mut query = reservations::Entity::find()
            .filter(reservations::Column::UnitId.eq(unit_id))
            .join(
                JoinType::InnerJoin,
                reservations::Relation::CustomerOrders.def(),
            )
            .filter(customer_orders::Column::Status.is_in(RESERVABLE));

        if let Some(order_id) = excluding_order {
            query = query.filter(reservations::Column::OrderId.ne(order_id));
        }

        let rows = query.all(conn).await?;
        Ok(rows.iter().map(|r| r.quantity).sum())
    }

    /// Brings an order's reservation rows in line with its demands.
    ///
    /// Availability is loaded on the caller's connection with the order's
    /// own prior rows added back; on shortfall nothing is touched and the
    /// caller's transaction aborts with the error.
    pub async fn sync_in(
        txn: &DatabaseTransaction,
        order_id: Uuid,
        demands: &[LineDemand],
    ) -> Result<(), ReservationLedgerError> {
        let existing = Self::rows_of_order(txn, order_id).await?;
        let existing_demands: Vec<LineDemand> = existing
            .iter()
            .map(|row| LineDemand {
                unit_id: row.unit_id,
                quantity: row.quantity,
            })
            .collect();

        let mut availability = Vec::with_capacity(demands.len());
        for demand in demands {
            let on_hand = stock_units::Entity::find()
                .filter(stock_units::Column::UnitId.eq(demand.unit_id))
                .one(txn)
                .await?
                .map_or(0, |row| row.on_hand);
            let reserved_other =
                Self::reserved_in(txn, demand.unit_id, Some(order_id)).await?;
            availability.push(UnitAvailability {
                unit_id: demand.unit_id,
                on_hand,
                reserved_other_orders: reserved_other,
            });
        }

        let plan = plan_sync(demands, &existing_demands, &availability)?;

        for upsert in &plan.upserts {
            match existing.iter().find(|row| row.unit_id == upsert.unit_id) {
                Some(row) if row.quantity == upsert.quantity => {}
                Some(row) => {
                    let mut active: reservations::ActiveModel = row.clone().into();
                    active.quantity = Set(upsert.quantity);
                    active.update(txn).await?;
                }
                None => {
                    reservations::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(order_id),
                        unit_id: Set(upsert.unit_id),
                        quantity: Set(upsert.quantity),
                    }
                    .insert(txn)
                    .await?;
                }
            }
        }

        if !plan.releases.is_empty() {
            reservations::Entity::delete_many()
                .filter(reservations::Column::OrderId.eq(order_id))
                .filter(reservations::Column::UnitId.is_in(plan.releases.clone()))
                .exec(txn)
                .await?;
        }

        Ok(())
    }

    /// Deletes all reservation rows of an order.
    pub async fn release_in(
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<(), DbErr> {
        reservations::Entity::delete_many()
            .filter(reservations::Column::OrderId.eq(order_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Loads an order's reservation rows.
    pub async fn rows_of_order<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<reservations::Model>, DbErr> {
        reservations::Entity::find()
            .filter(reservations::Column::OrderId.eq(order_id))
            .all(conn)
            .await
    }
}
