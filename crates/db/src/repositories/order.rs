//! Customer order repository: the lifecycle coordinator.
//!
//! State changes, payments, and refunds each run in one serializable
//! transaction that also executes the transition's entry effects
//! (reservation sync/release, delivery-time stock debit, cash movements).
//! Any effect failure aborts the whole transition.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use bodega_core::cash::{CashError, MovementKind};
use bodega_core::document::{validate_priced_lines, DocumentError, PricedLine};
use bodega_core::order::{
    net_paid, payment_auto_advance, plan_transition, refund_auto_revert, validate_collection,
    validate_refund, LifecycleError, OrderState, PaymentEvent, TransitionEffect,
};
use bodega_core::reservation::{LineDemand, ReservationError};
use bodega_core::stock::StockError;
use bodega_shared::types::round_cash;

use crate::entities::enums::{OrderStatus, PaymentEventKind};
use crate::entities::{customer_orders, order_lines, order_payments, reservations};
use crate::repositories::catalog::{CatalogError, CatalogRepository};
use crate::repositories::numbering::{
    format_number, next_sequence, MAX_NUMBERING_ATTEMPTS, ORDER_PREFIX,
};
use crate::repositories::register::{RecordMovementInput, RegisterError, RegisterRepository};
use crate::repositories::reservation::{ReservationLedgerError, ReservationRepository};
use crate::repositories::stock::{StockLedgerError, StockRepository};
use crate::repositories::is_unique_violation;

/// Errors raised by order operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// A lifecycle rule was violated.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A line failed validation.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A reservation rule was violated.
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    /// A stock rule was violated.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A cash rule was violated.
    #[error(transparent)]
    Cash(#[from] CashError),

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The payment method demands an external reference.
    #[error("Payment method requires a reference")]
    MissingReference,

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    /// Number generation kept colliding.
    #[error("Could not allocate an order number")]
    NumberingExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReservationLedgerError> for OrderError {
    fn from(err: ReservationLedgerError) -> Self {
        match err {
            ReservationLedgerError::Reservation(e) => Self::Reservation(e),
            ReservationLedgerError::Database(e) => Self::Database(e),
        }
    }
}

impl From<StockLedgerError> for OrderError {
    fn from(err: StockLedgerError) -> Self {
        match err {
            StockLedgerError::Stock(e) => Self::Stock(e),
            StockLedgerError::Catalog(e) => Self::Catalog(e),
            StockLedgerError::Database(e) => Self::Database(e),
        }
    }
}

impl From<RegisterError> for OrderError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Cash(e) => Self::Cash(e),
            RegisterError::NegativeOpeningFloat => {
                Self::Cash(CashError::NonPositiveAmount)
            }
            RegisterError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    /// Ordering client.
    pub client_id: Option<Uuid>,
    /// Whether the order holds stock while in a reservable state.
    pub reserves_stock: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Order lines.
    pub lines: Vec<PricedLine>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Input for recording a collection.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Amount collected.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// External reference when the method demands one.
    pub reference: Option<String>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Input for recording a refund.
#[derive(Debug, Clone)]
pub struct RefundInput {
    /// Amount returned.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// External reference when the method demands one.
    pub reference: Option<String>,
    /// The collection being unwound, if linked.
    pub refund_of: Option<Uuid>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// An order with its dependent rows.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    /// Order header.
    pub order: customer_orders::Model,
    /// Order lines.
    pub lines: Vec<order_lines::Model>,
    /// Payment events, oldest first.
    pub payments: Vec<order_payments::Model>,
    /// Active reservation rows.
    pub reservations: Vec<reservations::Model>,
}

/// Repository for customer orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
}

impl OrderRepository {
    /// Creates a new order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft order with its lines.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is persisted, or
    /// `NumberingExhausted` after repeated number collisions.
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderDetail, OrderError> {
        validate_priced_lines(&input.lines)?;

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            match self.create_order_once(&input).await {
                Err(OrderError::Database(err)) if is_unique_violation(&err) => {
                    warn!(attempt, "Order number collision, retrying");
                }
                other => return other,
            }
        }
        Err(OrderError::NumberingExhausted)
    }

    async fn create_order_once(
        &self,
        input: &CreateOrderInput,
    ) -> Result<OrderDetail, OrderError> {
        let txn = self.db.begin().await?;

        if let Some(client_id) = input.client_id {
            CatalogRepository::client_exists_in(&txn, client_id).await?;
        }
        for line in &input.lines {
            CatalogRepository::unit_in(&txn, line.unit_id).await?;
        }

        let number = Self::next_number(&txn).await?;
        let total = order_total(&input.lines);
        let now = Utc::now().into();

        let order = customer_orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number),
            client_id: Set(input.client_id),
            status: Set(OrderStatus::Draft),
            reserves_stock: Set(input.reserves_stock),
            total: Set(total),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let row = order_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                unit_id: Set(line.unit_id),
                quantity: Set(line.quantity),
                unit_price: Set(round_cash(line.unit_price)),
                discount: Set(round_cash(line.discount)),
            }
            .insert(&txn)
            .await?;
            lines.push(row);
        }

        txn.commit().await?;
        info!(order = %order.number, %total, "Order created");
        Ok(OrderDetail {
            order,
            lines,
            payments: vec![],
            reservations: vec![],
        })
    }

    /// Loads an order with lines, payments, and reservations.
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetail, OrderError> {
        let order = customer_orders::Entity::find_by_id(order_id)
            .one(&self.db)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let lines = Self::lines_of(&self.db, order_id).await?;
        let payments = Self::payments_of(&self.db, order_id).await?;
        let reservations = ReservationRepository::rows_of_order(&self.db, order_id).await?;
        Ok(OrderDetail {
            order,
            lines,
            payments,
            reservations,
        })
    }

    /// Applies a state change with its entry effects, atomically.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for a pair outside the table; any effect
    /// failure (`InsufficientAvailable`, `InsufficientStock`) rolls the
    /// whole change back.
    pub async fn change_state(
        &self,
        order_id: Uuid,
        target: OrderState,
        performed_by: Option<Uuid>,
    ) -> Result<customer_orders::Model, OrderError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let order = Self::find_order(&txn, order_id).await?;
        let events = Self::events_of(&txn, order_id).await?;
        let effects = plan_transition(order.status.into(), target, net_paid(&events))?;

        Self::apply_effects(&txn, &order, &effects, performed_by).await?;

        let from = order.status;
        let mut active: customer_orders::ActiveModel = order.into();
        active.status = Set(target.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(order = %updated.number, ?from, ?target, "Order state changed");
        Ok(updated)
    }

    /// Records a collection against an order.
    ///
    /// A first payment on a draft order advances it to confirmed (with
    /// reservation sync) in the same transaction. Cash-settling methods
    /// also append a register movement; its failure aborts everything.
    pub async fn add_payment(
        &self,
        order_id: Uuid,
        input: PaymentInput,
    ) -> Result<(order_payments::Model, customer_orders::Model), OrderError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let order = Self::find_order(&txn, order_id).await?;
        let method = CatalogRepository::payment_method_in(&txn, input.payment_method_id).await?;
        if method.requires_reference && input.reference.is_none() {
            return Err(OrderError::MissingReference);
        }

        let events = Self::events_of(&txn, order_id).await?;
        let amount = validate_collection(order.total, &events, input.amount)?;

        let payment = order_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            occurred_at: Set(Utc::now().into()),
            kind: Set(PaymentEventKind::Collection),
            amount: Set(amount),
            payment_method_id: Set(input.payment_method_id),
            reference: Set(input.reference.clone()),
            refund_of: Set(None),
            performed_by: Set(input.performed_by),
        }
        .insert(&txn)
        .await?;

        if method.affects_cash_ledger {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::SaleCollection,
                    amount,
                    memo: Some(format!("Payment on order {}", order.number)),
                    document_ref: Some(order.number.clone()),
                    performed_by: input.performed_by,
                },
            )
            .await?;
        }

        let order = if let Some((next_state, effects)) =
            payment_auto_advance(order.status.into())
        {
            Self::apply_effects(&txn, &order, &effects, input.performed_by).await?;
            let mut active: customer_orders::ActiveModel = order.into();
            active.status = Set(next_state.into());
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        } else {
            order
        };

        txn.commit().await?;
        info!(order = %order.number, %amount, "Collection recorded");
        Ok((payment, order))
    }

    /// Records a refund against an order.
    ///
    /// A refund that brings the net paid amount to zero reverts a
    /// confirmed order to draft and releases its holds, atomically.
    pub async fn add_refund(
        &self,
        order_id: Uuid,
        input: RefundInput,
    ) -> Result<(order_payments::Model, customer_orders::Model), OrderError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let order = Self::find_order(&txn, order_id).await?;
        let method = CatalogRepository::payment_method_in(&txn, input.payment_method_id).await?;

        let events = Self::events_of(&txn, order_id).await?;
        let amount = validate_refund(&events, input.amount, input.refund_of)?;

        let refund = order_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            occurred_at: Set(Utc::now().into()),
            kind: Set(PaymentEventKind::Refund),
            amount: Set(amount),
            payment_method_id: Set(input.payment_method_id),
            reference: Set(input.reference.clone()),
            refund_of: Set(input.refund_of),
            performed_by: Set(input.performed_by),
        }
        .insert(&txn)
        .await?;

        if method.affects_cash_ledger {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::Outflow,
                    amount,
                    memo: Some(format!("Refund on order {}", order.number)),
                    document_ref: Some(order.number.clone()),
                    performed_by: input.performed_by,
                },
            )
            .await?;
        }

        let remaining = net_paid(&Self::events_of(&txn, order_id).await?);
        let order = if let Some((next_state, effects)) =
            refund_auto_revert(order.status.into(), remaining)
        {
            Self::apply_effects(&txn, &order, &effects, input.performed_by).await?;
            let mut active: customer_orders::ActiveModel = order.into();
            active.status = Set(next_state.into());
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        } else {
            order
        };

        txn.commit().await?;
        info!(order = %order.number, %amount, "Refund recorded");
        Ok((refund, order))
    }

    /// Executes transition entry effects inside the caller's transaction.
    async fn apply_effects(
        txn: &DatabaseTransaction,
        order: &customer_orders::Model,
        effects: &[TransitionEffect],
        performed_by: Option<Uuid>,
    ) -> Result<(), OrderError> {
        for effect in effects {
            match effect {
                TransitionEffect::SyncReservations => {
                    if order.reserves_stock {
                        let demands = Self::demands_of(txn, order.id).await?;
                        ReservationRepository::sync_in(txn, order.id, &demands).await?;
                    }
                }
                TransitionEffect::ReleaseReservations => {
                    ReservationRepository::release_in(txn, order.id).await?;
                }
                TransitionEffect::DeliverStock => {
                    let lines = Self::lines_of(txn, order.id).await?;
                    for line in &lines {
                        let cost = StockRepository::snapshot_cost_in(txn, line.unit_id).await?;
                        StockRepository::outbound_in(
                            txn,
                            line.unit_id,
                            line.quantity,
                            cost,
                            Some(order.number.clone()),
                            performed_by,
                        )
                        .await?;
                    }
                    ReservationRepository::release_in(txn, order.id).await?;
                }
            }
        }
        Ok(())
    }

    async fn find_order(
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<customer_orders::Model, OrderError> {
        customer_orders::Entity::find_by_id(order_id)
            .one(txn)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    async fn lines_of<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_lines::Model>, DbErr> {
        order_lines::Entity::find()
            .filter(order_lines::Column::OrderId.eq(order_id))
            .all(conn)
            .await
    }

    async fn payments_of<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_payments::Model>, DbErr> {
        order_payments::Entity::find()
            .filter(order_payments::Column::OrderId.eq(order_id))
            .order_by_asc(order_payments::Column::OccurredAt)
            .all(conn)
            .await
    }

    async fn events_of<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<PaymentEvent>, DbErr> {
        let rows = Self::payments_of(conn, order_id).await?;
        Ok(rows
            .iter()
            .map(|row| PaymentEvent {
                id: row.id,
                kind: row.kind.into(),
                amount: row.amount,
                refund_of: row.refund_of,
            })
            .collect())
    }

    async fn demands_of(
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Vec<LineDemand>, DbErr> {
        let lines = Self::lines_of(txn, order_id).await?;
        Ok(lines
            .iter()
            .map(|line| LineDemand {
                unit_id: line.unit_id,
                quantity: line.quantity,
            })
            .collect())
    }

    async fn next_number(txn: &DatabaseTransaction) -> Result<String, DbErr> {
        let last = customer_orders::Entity::find()
            .order_by_desc(customer_orders::Column::Number)
            .limit(1)
            .one(txn)
            .await?
            .map(|order| order.number);
        Ok(format_number(
            ORDER_PREFIX,
            next_sequence(last.as_deref(), ORDER_PREFIX),
        ))
    }
}

/// Total of a set of priced lines, rounded to cash scale.
fn order_total(lines: &[PricedLine]) -> Decimal {
    let total: Decimal = lines
        .iter()
        .map(|line| (line.unit_price - line.discount) * Decimal::from(line.quantity))
        .sum();
    round_cash(total)
}
