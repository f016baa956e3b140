//! Sale orchestrator.
//!
//! A sale composes the stock and cash ledgers in one serializable
//! transaction: availability is checked up front for every line (stock
//! minus active reservations, re-read inside the transaction), costs are
//! frozen per line, stock is debited, and cash-settling methods append a
//! collection to the open register session. Voiding replays the original
//! frozen costs, never a recomputed average.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use bodega_core::cash::{CashError, MovementKind};
use bodega_core::document::{validate_priced_lines, DocumentError, DocumentStatus, PricedLine};
use bodega_core::reservation::{available_quantity, ReservationError};
use bodega_core::stock::StockError;
use bodega_shared::types::round_cash;

use crate::entities::enums::DocumentStatus as DbDocumentStatus;
use crate::entities::{sale_lines, sales};
use crate::repositories::catalog::{CatalogError, CatalogRepository};
use crate::repositories::numbering::{
    format_number, next_sequence, MAX_NUMBERING_ATTEMPTS, SALE_PREFIX,
};
use crate::repositories::register::{RecordMovementInput, RegisterError, RegisterRepository};
use crate::repositories::reservation::ReservationRepository;
use crate::repositories::stock::{StockLedgerError, StockRepository};
use crate::repositories::is_unique_violation;

/// Errors raised by sale operations.
#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    /// A line failed validation.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Not enough unreserved stock for a line.
    #[error(transparent)]
    Availability(#[from] ReservationError),

    /// A stock rule was violated.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A cash rule was violated.
    #[error(transparent)]
    Cash(#[from] CashError),

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    /// Number generation kept colliding.
    #[error("Could not allocate a sale number")]
    NumberingExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StockLedgerError> for SaleError {
    fn from(err: StockLedgerError) -> Self {
        match err {
            StockLedgerError::Stock(e) => Self::Stock(e),
            StockLedgerError::Catalog(e) => Self::Catalog(e),
            StockLedgerError::Database(e) => Self::Database(e),
        }
    }
}

impl From<RegisterError> for SaleError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Cash(e) => Self::Cash(e),
            RegisterError::NegativeOpeningFloat => Self::Cash(CashError::NonPositiveAmount),
            RegisterError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating a sale.
#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    /// Buying client, if identified.
    pub client_id: Option<Uuid>,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// Sale lines.
    pub lines: Vec<PricedLine>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// A sale with its lines.
#[derive(Debug, Clone)]
pub struct SaleWithLines {
    /// Sale header.
    pub sale: sales::Model,
    /// Sale lines with frozen costs.
    pub lines: Vec<sale_lines::Model>,
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
}

impl SaleRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a sale.
    ///
    /// # Errors
    ///
    /// Rejects invalid lines before any transaction starts, and a
    /// cash-settling sale with `NoOpenSession` before any mutation.
    /// Inside the transaction, the first availability shortfall aborts
    /// with `InsufficientAvailable` and nothing is applied.
    pub async fn create_sale(&self, input: CreateSaleInput) -> Result<SaleWithLines, SaleError> {
        validate_priced_lines(&input.lines)?;

        // Reject up front when the method settles cash and no session is
        // open; the movement insert re-checks inside the transaction.
        let method = CatalogRepository::payment_method_in(&self.db, input.payment_method_id)
            .await?;
        if method.affects_cash_ledger
            && RegisterRepository::find_open(&self.db).await?.is_none()
        {
            return Err(CashError::NoOpenSession.into());
        }

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            match self.create_sale_once(&input, method.affects_cash_ledger).await {
                Err(SaleError::Database(err)) if is_unique_violation(&err) => {
                    warn!(attempt, "Sale number collision, retrying");
                }
                other => return other,
            }
        }
        Err(SaleError::NumberingExhausted)
    }

    async fn create_sale_once(
        &self,
        input: &CreateSaleInput,
        settles_cash: bool,
    ) -> Result<SaleWithLines, SaleError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        if let Some(client_id) = input.client_id {
            CatalogRepository::client_exists_in(&txn, client_id).await?;
        }

        // Fail fast: every line must clear stock minus active holds before
        // anything is applied. Direct sales hold no reservation of their
        // own; this check and the decrement share one serializable
        // transaction, which is what makes concurrent last-unit sales safe.
        Self::check_availability(&txn, &input.lines).await?;

        let number = Self::next_number(&txn).await?;
        let total = sale_total(&input.lines);

        let sale = sales::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number.clone()),
            occurred_at: Set(Utc::now().into()),
            client_id: Set(input.client_id),
            payment_method_id: Set(input.payment_method_id),
            status: Set(DbDocumentStatus::Registered),
            total: Set(total),
            performed_by: Set(input.performed_by),
            voided_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let cost = StockRepository::snapshot_cost_in(&txn, line.unit_id).await?;
            StockRepository::outbound_in(
                &txn,
                line.unit_id,
                line.quantity,
                cost,
                Some(number.clone()),
                input.performed_by,
            )
            .await?;

            let row = sale_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale.id),
                unit_id: Set(line.unit_id),
                quantity: Set(line.quantity),
                unit_price: Set(round_cash(line.unit_price)),
                discount: Set(round_cash(line.discount)),
                unit_cost: Set(cost),
            }
            .insert(&txn)
            .await?;
            lines.push(row);
        }

        if settles_cash && total > Decimal::ZERO {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::SaleCollection,
                    amount: total,
                    memo: None,
                    document_ref: Some(number.clone()),
                    performed_by: input.performed_by,
                },
            )
            .await?;
        }

        txn.commit().await?;
        info!(sale = %number, %total, "Sale registered");
        Ok(SaleWithLines { sale, lines })
    }

    /// Voids a sale, reversing its stock and cash effects.
    ///
    /// Stock returns at each line's originally frozen cost regardless of
    /// later average drift; cash-settling sales push the collected amount
    /// back out of the drawer.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyVoided` on repeat with no further side effects.
    pub async fn void_sale(
        &self,
        sale_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> Result<SaleWithLines, SaleError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let sale = sales::Entity::find_by_id(sale_id)
            .one(&txn)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))?;
        DocumentStatus::from(sale.status).ensure_voidable()?;

        let lines = sale_lines::Entity::find()
            .filter(sale_lines::Column::SaleId.eq(sale_id))
            .all(&txn)
            .await?;

        for line in &lines {
            StockRepository::inbound_in(
                &txn,
                line.unit_id,
                line.quantity,
                line.unit_cost,
                Some(sale.number.clone()),
                performed_by,
            )
            .await?;
        }

        let method = CatalogRepository::payment_method_in(&txn, sale.payment_method_id).await?;
        if method.affects_cash_ledger && sale.total > Decimal::ZERO {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::Outflow,
                    amount: sale.total,
                    memo: Some(format!("Void of sale {}", sale.number)),
                    document_ref: Some(sale.number.clone()),
                    performed_by,
                },
            )
            .await?;
        }

        let number = sale.number.clone();
        let mut active: sales::ActiveModel = sale.into();
        active.status = Set(DbDocumentStatus::Voided);
        active.voided_at = Set(Some(Utc::now().into()));
        let voided = active.update(&txn).await?;

        txn.commit().await?;
        info!(sale = %number, "Sale voided");
        Ok(SaleWithLines {
            sale: voided,
            lines,
        })
    }

    /// Checks every line against stock minus active reservations.
    async fn check_availability(
        txn: &DatabaseTransaction,
        lines: &[PricedLine],
    ) -> Result<(), SaleError> {
        let mut demanded: Vec<(Uuid, i32)> = Vec::new();
        for line in lines {
            CatalogRepository::unit_in(txn, line.unit_id).await?;
            match demanded.iter_mut().find(|(unit, _)| *unit == line.unit_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => demanded.push((line.unit_id, line.quantity)),
            }
        }

        for (unit_id, quantity) in demanded {
            let level = StockRepository::load_level(txn, unit_id).await?;
            let reserved = ReservationRepository::reserved_in(txn, unit_id, None).await?;
            let available = available_quantity(level.on_hand, reserved);
            if quantity > available {
                return Err(ReservationError::InsufficientAvailable {
                    unit_id,
                    requested: quantity,
                    available,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn next_number(txn: &DatabaseTransaction) -> Result<String, DbErr> {
        let last = sales::Entity::find()
            .order_by_desc(sales::Column::Number)
            .limit(1)
            .one(txn)
            .await?
            .map(|sale| sale.number);
        Ok(format_number(
            SALE_PREFIX,
            next_sequence(last.as_deref(), SALE_PREFIX),
        ))
    }
}

/// Total of a sale's lines, rounded to cash scale.
fn sale_total(lines: &[PricedLine]) -> Decimal {
    let total: Decimal = lines
        .iter()
        .map(|line| (line.unit_price - line.discount) * Decimal::from(line.quantity))
        .sum();
    round_cash(total)
}
