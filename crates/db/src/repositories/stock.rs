//! Stock ledger repository.
//!
//! Owns per-unit stock rows and the append-only inventory movement trail.
//! Mutations run inside the calling orchestrator's transaction; the level
//! is re-read on that connection so sufficiency is decided against current
//! state, never a stale snapshot.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, IsolationLevel, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use bodega_core::reservation::available_quantity;
use bodega_core::stock::{snapshot_cost, StockError, StockLevel};

use crate::entities::enums::InventoryMovementKind;
use crate::entities::{inventory_movements, stock_units};
use crate::repositories::catalog::{CatalogError, CatalogRepository};
use crate::repositories::reservation::ReservationRepository;

/// Errors raised by stock ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StockLedgerError {
    /// A stock rule was violated.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Availability of one unit as reported to callers.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UnitAvailabilityView {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity on hand.
    pub on_hand: i32,
    /// Quantity held by active reservations.
    pub reserved: i32,
    /// On hand minus reserved.
    pub available: i32,
    /// Current weighted-average cost.
    pub average_cost: Decimal,
    /// Restock alert threshold, if configured.
    pub minimum_threshold: Option<i32>,
}

/// Repository for stock levels and inventory movements.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reports availability for one unit.
    ///
    /// `excluding_order` lets an order being edited see the stock it
    /// already holds. Read-only; runs at default isolation and may be
    /// stale for display.
    pub async fn availability(
        &self,
        unit_id: Uuid,
        excluding_order: Option<Uuid>,
    ) -> Result<UnitAvailabilityView, StockLedgerError> {
        Self::availability_in(&self.db, unit_id, excluding_order).await
    }

    /// Reports availability for a batch of units.
    pub async fn availability_batch(
        &self,
        unit_ids: &[Uuid],
    ) -> Result<Vec<UnitAvailabilityView>, StockLedgerError> {
        let mut views = Vec::with_capacity(unit_ids.len());
        for unit_id in unit_ids {
            views.push(Self::availability_in(&self.db, *unit_id, None).await?);
        }
        Ok(views)
    }

    /// Applies a signed manual adjustment in its own serializable
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when a negative adjustment would drive
    /// the quantity below zero.
    pub async fn apply_adjustment(
        &self,
        unit_id: Uuid,
        quantity: i32,
        reason: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<UnitAvailabilityView, StockLedgerError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        CatalogRepository::unit_in(&txn, unit_id).await?;
        let level = Self::load_level(&txn, unit_id).await?;
        let (next, cost) = level.apply_adjustment(quantity)?;
        Self::store_level(&txn, &next).await?;
        Self::append_with_memo(
            &txn,
            unit_id,
            InventoryMovementKind::Adjustment,
            quantity,
            Some(cost),
            None,
            reason,
            performed_by,
        )
        .await?;

        let view = Self::availability_in(&txn, unit_id, None).await?;
        txn.commit().await?;
        info!(%unit_id, quantity, "Stock adjustment applied");
        Ok(view)
    }

    /// Applies an inbound movement inside the caller's transaction.
    pub async fn inbound_in(
        txn: &DatabaseTransaction,
        unit_id: Uuid,
        quantity: i32,
        unit_cost: Decimal,
        document_ref: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<(), StockLedgerError> {
        let level = Self::load_level(txn, unit_id).await?;
        let next = level.apply_inbound(quantity, unit_cost)?;
        Self::store_level(txn, &next).await?;
        Self::append(
            txn,
            unit_id,
            InventoryMovementKind::Inbound,
            quantity,
            Some(unit_cost),
            document_ref,
            performed_by,
        )
        .await
    }

    /// Applies an outbound movement inside the caller's transaction.
    ///
    /// `frozen_cost` is the cost the calling line froze (the weighted
    /// average at decision time, or a document's original cost on void);
    /// it is recorded on the movement unchanged.
    pub async fn outbound_in(
        txn: &DatabaseTransaction,
        unit_id: Uuid,
        quantity: i32,
        frozen_cost: Decimal,
        document_ref: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<(), StockLedgerError> {
        let level = Self::load_level(txn, unit_id).await?;
        let (next, _) = level.apply_outbound(quantity)?;
        Self::store_level(txn, &next).await?;
        Self::append(
            txn,
            unit_id,
            InventoryMovementKind::Outbound,
            -quantity,
            Some(frozen_cost),
            document_ref,
            performed_by,
        )
        .await
    }

    /// Resolves the cost to freeze for a unit inside the transaction.
    ///
    /// Falls back from the weighted average to the unit's and then the
    /// product's default cost; a zero snapshot is permitted and logged.
    pub async fn snapshot_cost_in(
        txn: &DatabaseTransaction,
        unit_id: Uuid,
    ) -> Result<Decimal, StockLedgerError> {
        let level = Self::load_level(txn, unit_id).await?;
        let (unit, product) = CatalogRepository::unit_with_product_in(txn, unit_id).await?;

        let cost = snapshot_cost(
            level.average_cost,
            unit.default_cost,
            product.and_then(|p| p.default_cost),
        );
        if cost.is_zero() {
            warn!(%unit_id, "Freezing a zero cost snapshot");
        }
        Ok(cost)
    }

    /// Loads a unit's level, creating the zeroed stock row on first touch.
    pub async fn load_level(
        txn: &DatabaseTransaction,
        unit_id: Uuid,
    ) -> Result<StockLevel, StockLedgerError> {
        if let Some(row) = Self::find_row(txn, unit_id).await? {
            return Ok(StockLevel {
                unit_id,
                on_hand: row.on_hand,
                average_cost: row.average_cost,
            });
        }

        stock_units::ActiveModel {
            id: Set(Uuid::new_v4()),
            unit_id: Set(unit_id),
            on_hand: Set(0),
            minimum_threshold: Set(None),
            average_cost: Set(Decimal::ZERO),
        }
        .insert(txn)
        .await?;

        Ok(StockLevel::empty(unit_id))
    }

    async fn store_level(
        txn: &DatabaseTransaction,
        level: &StockLevel,
    ) -> Result<(), StockLedgerError> {
        let row = Self::find_row(txn, level.unit_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("stock row for {}", level.unit_id)))?;

        let mut active: stock_units::ActiveModel = row.into();
        active.on_hand = Set(level.on_hand);
        active.average_cost = Set(level.average_cost);
        active.update(txn).await?;
        Ok(())
    }

    async fn find_row<C: ConnectionTrait>(
        conn: &C,
        unit_id: Uuid,
    ) -> Result<Option<stock_units::Model>, DbErr> {
        stock_units::Entity::find()
            .filter(stock_units::Column::UnitId.eq(unit_id))
            .one(conn)
            .await
    }

    async fn availability_in<C: ConnectionTrait>(
        conn: &C,
        unit_id: Uuid,
        excluding_order: Option<Uuid>,
    ) -> Result<UnitAvailabilityView, StockLedgerError> {
        let row = Self::find_row(conn, unit_id).await?;
        let (on_hand, average_cost, minimum_threshold) = row.map_or(
            (0, Decimal::ZERO, None),
            |r| (r.on_hand, r.average_cost, r.minimum_threshold),
        );
        let reserved = ReservationRepository::reserved_in(conn, unit_id, excluding_order).await?;

        Ok(UnitAvailabilityView {
            unit_id,
            on_hand,
            reserved,
            available: available_quantity(on_hand, reserved),
            average_cost,
            minimum_threshold,
        })
    }

    async fn append(
        txn: &impl ConnectionTrait,
        unit_id: Uuid,
        kind: InventoryMovementKind,
        quantity: i32,
        unit_cost: Option<Decimal>,
        document_ref: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<(), StockLedgerError> {
        Self::append_with_memo(
            txn,
            unit_id,
            kind,
            quantity,
            unit_cost,
            document_ref,
            None,
            performed_by,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_with_memo(
        txn: &impl ConnectionTrait,
        unit_id: Uuid,
        kind: InventoryMovementKind,
        quantity: i32,
        unit_cost: Option<Decimal>,
        document_ref: Option<String>,
        memo: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<(), StockLedgerError> {
        inventory_movements::ActiveModel {
            id: Set(Uuid::new_v4()),
            occurred_at: Set(Utc::now().into()),
            unit_id: Set(unit_id),
            kind: Set(kind),
            quantity: Set(quantity),
            unit_cost: Set(unit_cost),
            document_ref: Set(document_ref),
            memo: Set(memo),
            performed_by: Set(performed_by),
        }
        .insert(txn)
        .await?;
        Ok(())
    }
}
