//! Return orchestrator.
//!
//! Returns run in both directions. A sale return brings goods back into
//! stock at the snapshot cost and refunds the client out of the drawer; a
//! purchase return sends goods back to the supplier (with a sufficiency
//! check) and takes cash in. Both compose their stock and cash effects in
//! one serializable transaction, and voiding replays the frozen costs the
//! other way.

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
use bodega_core::stock::StockError;
use bodega_shared::types::round_cash;

use crate::entities::enums::{DocumentStatus as DbDocumentStatus, ReturnKind};
use crate::entities::{return_lines, returns};
use crate::repositories::catalog::{CatalogError, CatalogRepository};
use crate::repositories::numbering::{
    format_number, next_sequence, MAX_NUMBERING_ATTEMPTS, RETURN_PREFIX,
};
use crate::repositories::register::{RecordMovementInput, RegisterError, RegisterRepository};
use crate::repositories::stock::{StockLedgerError, StockRepository};
use crate::repositories::is_unique_violation;

/// Errors raised by return operations.
#[derive(Debug, thiserror::Error)]
pub enum ReturnError {
    /// A line failed validation.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A stock rule was violated.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A cash rule was violated.
    #[error(transparent)]
    Cash(#[from] CashError),

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A sale return needs a client, a purchase return a supplier.
    #[error("Return counterparty is missing")]
    MissingCounterparty,

    /// Return not found.
    #[error("Return not found: {0}")]
    ReturnNotFound(Uuid),

    /// Number generation kept colliding.
    #[error("Could not allocate a return number")]
    NumberingExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StockLedgerError> for ReturnError {
    fn from(err: StockLedgerError) -> Self {
        match err {
            StockLedgerError::Stock(e) => Self::Stock(e),
            StockLedgerError::Catalog(e) => Self::Catalog(e),
            StockLedgerError::Database(e) => Self::Database(e),
        }
    }
}

impl From<RegisterError> for ReturnError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Cash(e) => Self::Cash(e),
            RegisterError::NegativeOpeningFloat => Self::Cash(CashError::NonPositiveAmount),
            RegisterError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating a return.
#[derive(Debug, Clone)]
pub struct CreateReturnInput {
    /// Direction of the return.
    pub kind: ReturnKind,
    /// Returning client (sale returns).
    pub client_id: Option<Uuid>,
    /// Receiving supplier (purchase returns).
    pub supplier_id: Option<Uuid>,
    /// Settlement method when money moves immediately.
    pub payment_method_id: Option<Uuid>,
    /// Returned lines.
    pub lines: Vec<PricedLine>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// A return with its lines.
#[derive(Debug, Clone)]
pub struct ReturnWithLines {
    /// Return header.
    pub document: returns::Model,
    /// Return lines with frozen costs.
    pub lines: Vec<return_lines::Model>,
}

/// Repository for returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    db: DatabaseConnection,
}

impl ReturnRepository {
    /// Creates a new return repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a return.
    ///
    /// # Errors
    ///
    /// Rejects invalid lines and a missing counterparty before any
    /// transaction starts. A purchase return failing its stock check, or a
    /// cash refund overdrawing the session, aborts with nothing applied.
    pub async fn create_return(
        &self,
        input: CreateReturnInput,
    ) -> Result<ReturnWithLines, ReturnError> {
        validate_priced_lines(&input.lines)?;
        match input.kind {
            ReturnKind::SaleReturn if input.client_id.is_none() => {
                return Err(ReturnError::MissingCounterparty);
            }
            ReturnKind::PurchaseReturn if input.supplier_id.is_none() => {
                return Err(ReturnError::MissingCounterparty);
            }
            _ => {}
        }

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            match self.create_return_once(&input).await {
                Err(ReturnError::Database(err)) if is_unique_violation(&err) => {
                    warn!(attempt, "Return number collision, retrying");
                }
                other => return other,
            }
        }
        Err(ReturnError::NumberingExhausted)
    }

    async fn create_return_once(
        &self,
        input: &CreateReturnInput,
    ) -> Result<ReturnWithLines, ReturnError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        if let Some(client_id) = input.client_id {
            CatalogRepository::client_exists_in(&txn, client_id).await?;
        }
        if let Some(supplier_id) = input.supplier_id {
            CatalogRepository::supplier_exists_in(&txn, supplier_id).await?;
        }
        let method = match input.payment_method_id {
            Some(id) => Some(CatalogRepository::payment_method_in(&txn, id).await?),
            None => None,
        };

        let number = Self::next_number(&txn).await?;
        let total = return_total(&input.lines);

        let document = returns::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number.clone()),
            occurred_at: Set(Utc::now().into()),
            kind: Set(input.kind),
            client_id: Set(input.client_id),
            supplier_id: Set(input.supplier_id),
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
            match input.kind {
                ReturnKind::SaleReturn => {
                    StockRepository::inbound_in(
                        &txn,
                        line.unit_id,
                        line.quantity,
                        cost,
                        Some(number.clone()),
                        input.performed_by,
                    )
                    .await?;
                }
                ReturnKind::PurchaseReturn => {
                    StockRepository::outbound_in(
                        &txn,
                        line.unit_id,
                        line.quantity,
                        cost,
                        Some(number.clone()),
                        input.performed_by,
                    )
                    .await?;
                }
            }

            let row = return_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                return_id: Set(document.id),
                unit_id: Set(line.unit_id),
                quantity: Set(line.quantity),
                unit_price: Set(round_cash(line.unit_price)),
                unit_cost: Set(cost),
            }
            .insert(&txn)
            .await?;
            lines.push(row);
        }

        if method.as_ref().is_some_and(|m| m.affects_cash_ledger) && total > Decimal::ZERO {
            let (kind, memo) = match input.kind {
                ReturnKind::SaleReturn => (
                    MovementKind::Outflow,
                    format!("Client refund for return {number}"),
                ),
                ReturnKind::PurchaseReturn => (
                    MovementKind::Inflow,
                    format!("Supplier refund for return {number}"),
                ),
            };
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind,
                    amount: total,
                    memo: Some(memo),
                    document_ref: Some(number.clone()),
                    performed_by: input.performed_by,
                },
            )
            .await?;
        }

        txn.commit().await?;
        info!(document = %number, kind = ?input.kind, %total, "Return registered");
        Ok(ReturnWithLines { document, lines })
    }

    /// Voids a return, replaying its frozen costs the other way.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyVoided` on repeat with no further side effects.
    pub async fn void_return(
        &self,
        return_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> Result<ReturnWithLines, ReturnError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let document = returns::Entity::find_by_id(return_id)
            .one(&txn)
            .await?
            .ok_or(ReturnError::ReturnNotFound(return_id))?;
        DocumentStatus::from(document.status).ensure_voidable()?;

        let lines = return_lines::Entity::find()
            .filter(return_lines::Column::ReturnId.eq(return_id))
            .all(&txn)
            .await?;

        for line in &lines {
            match document.kind {
                ReturnKind::SaleReturn => {
                    StockRepository::outbound_in(
                        &txn,
                        line.unit_id,
                        line.quantity,
                        line.unit_cost,
                        Some(document.number.clone()),
                        performed_by,
                    )
                    .await?;
                }
                ReturnKind::PurchaseReturn => {
                    StockRepository::inbound_in(
                        &txn,
                        line.unit_id,
                        line.quantity,
                        line.unit_cost,
                        Some(document.number.clone()),
                        performed_by,
                    )
                    .await?;
                }
            }
        }

        let method = match document.payment_method_id {
            Some(id) => Some(CatalogRepository::payment_method_in(&txn, id).await?),
            None => None,
        };
        if method.as_ref().is_some_and(|m| m.affects_cash_ledger)
            && document.total > Decimal::ZERO
        {
            let (kind, memo) = match document.kind {
                ReturnKind::SaleReturn => (
                    MovementKind::Inflow,
                    format!("Void of return {}", document.number),
                ),
                ReturnKind::PurchaseReturn => (
                    MovementKind::Outflow,
                    format!("Void of return {}", document.number),
                ),
            };
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind,
                    amount: document.total,
                    memo: Some(memo),
                    document_ref: Some(document.number.clone()),
                    performed_by,
                },
            )
            .await?;
        }

        let number = document.number.clone();
        let mut active: returns::ActiveModel = document.into();
        active.status = Set(DbDocumentStatus::Voided);
        active.voided_at = Set(Some(Utc::now().into()));
        let voided = active.update(&txn).await?;

        txn.commit().await?;
        info!(document = %number, "Return voided");
        Ok(ReturnWithLines {
            document: voided,
            lines,
        })
    }

    async fn next_number(txn: &DatabaseTransaction) -> Result<String, DbErr> {
        let last = returns::Entity::find()
            .order_by_desc(returns::Column::Number)
            .limit(1)
            .one(txn)
            .await?
            .map(|document| document.number);
        Ok(format_number(
            RETURN_PREFIX,
            next_sequence(last.as_deref(), RETURN_PREFIX),
        ))
    }
}

/// Total of a return's lines, rounded to cash scale.
fn return_total(lines: &[PricedLine]) -> Decimal {
    let total: Decimal = lines
        .iter()
        .map(|line| (line.unit_price - line.discount) * Decimal::from(line.quantity))
        .sum();
    round_cash(total)
}
