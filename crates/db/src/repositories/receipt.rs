//! Purchase receipt orchestrator.
//!
//! Receiving goods applies per-line inbound movements (recomputing the
//! weighted averages with the caller-supplied costs) and, for cash-settled
//! receipts, pays the supplier out of the open register session, all in one
//! serializable transaction. Voiding replays the frozen line costs.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use bodega_core::cash::{CashError, MovementKind};
use bodega_core::document::{validate_costed_lines, CostedLine, DocumentError, DocumentStatus};
use bodega_core::stock::StockError;
use bodega_shared::types::{round_cash, round_cost};

use crate::entities::enums::DocumentStatus as DbDocumentStatus;
use crate::entities::{purchase_receipt_lines, purchase_receipts};
use crate::repositories::catalog::{CatalogError, CatalogRepository};
use crate::repositories::numbering::{
    format_number, next_sequence, MAX_NUMBERING_ATTEMPTS, RECEIPT_PREFIX,
};
use crate::repositories::register::{RecordMovementInput, RegisterError, RegisterRepository};
use crate::repositories::stock::{StockLedgerError, StockRepository};
use crate::repositories::is_unique_violation;

/// Errors raised by purchase receipt operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
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

    /// Receipt not found.
    #[error("Purchase receipt not found: {0}")]
    ReceiptNotFound(Uuid),

    /// Number generation kept colliding.
    #[error("Could not allocate a receipt number")]
    NumberingExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StockLedgerError> for ReceiptError {
    fn from(err: StockLedgerError) -> Self {
        match err {
            StockLedgerError::Stock(e) => Self::Stock(e),
            StockLedgerError::Catalog(e) => Self::Catalog(e),
            StockLedgerError::Database(e) => Self::Database(e),
        }
    }
}

impl From<RegisterError> for ReceiptError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Cash(e) => Self::Cash(e),
            RegisterError::NegativeOpeningFloat => Self::Cash(CashError::NonPositiveAmount),
            RegisterError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating a purchase receipt.
#[derive(Debug, Clone)]
pub struct CreateReceiptInput {
    /// Delivering supplier.
    pub supplier_id: Uuid,
    /// Settlement method when paid immediately; `None` for on-account.
    pub payment_method_id: Option<Uuid>,
    /// Free-form reference to the supplier order being received.
    pub order_reference: Option<String>,
    /// Received lines with caller-supplied costs.
    pub lines: Vec<CostedLine>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// A receipt with its lines.
#[derive(Debug, Clone)]
pub struct ReceiptWithLines {
    /// Receipt header.
    pub receipt: purchase_receipts::Model,
    /// Receipt lines.
    pub lines: Vec<purchase_receipt_lines::Model>,
}

/// Repository for purchase receipts.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a purchase receipt.
    ///
    /// # Errors
    ///
    /// Rejects invalid lines before any transaction starts. A cash-settled
    /// receipt whose supplier payment overdraws the session fails
    /// `InsufficientFunds` and nothing is applied.
    pub async fn create_receipt(
        &self,
        input: CreateReceiptInput,
    ) -> Result<ReceiptWithLines, ReceiptError> {
        validate_costed_lines(&input.lines)?;

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            match self.create_receipt_once(&input).await {
                Err(ReceiptError::Database(err)) if is_unique_violation(&err) => {
                    warn!(attempt, "Receipt number collision, retrying");
                }
                other => return other,
            }
        }
        Err(ReceiptError::NumberingExhausted)
    }

    async fn create_receipt_once(
        &self,
        input: &CreateReceiptInput,
    ) -> Result<ReceiptWithLines, ReceiptError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        CatalogRepository::supplier_exists_in(&txn, input.supplier_id).await?;
        for line in &input.lines {
            CatalogRepository::unit_in(&txn, line.unit_id).await?;
        }
        let method = match input.payment_method_id {
            Some(id) => Some(CatalogRepository::payment_method_in(&txn, id).await?),
            None => None,
        };

        let number = Self::next_number(&txn).await?;
        let total = receipt_total(&input.lines);

        let receipt = purchase_receipts::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number.clone()),
            occurred_at: Set(Utc::now().into()),
            supplier_id: Set(input.supplier_id),
            payment_method_id: Set(input.payment_method_id),
            order_reference: Set(input.order_reference.clone()),
            status: Set(DbDocumentStatus::Registered),
            total: Set(total),
            performed_by: Set(input.performed_by),
            voided_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let cost = round_cost(line.unit_cost);
            StockRepository::inbound_in(
                &txn,
                line.unit_id,
                line.quantity,
                cost,
                Some(number.clone()),
                input.performed_by,
            )
            .await?;

            let row = purchase_receipt_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                receipt_id: Set(receipt.id),
                unit_id: Set(line.unit_id),
                quantity: Set(line.quantity),
                unit_cost: Set(cost),
            }
            .insert(&txn)
            .await?;
            lines.push(row);
        }

        if method.as_ref().is_some_and(|m| m.affects_cash_ledger) && total > Decimal::ZERO {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::SupplierPayment,
                    amount: total,
                    memo: None,
                    document_ref: Some(number.clone()),
                    performed_by: input.performed_by,
                },
            )
            .await?;
        }

        txn.commit().await?;
        info!(receipt = %number, %total, "Purchase receipt registered");
        Ok(ReceiptWithLines { receipt, lines })
    }

    /// Voids a receipt, reversing its stock and cash effects.
    ///
    /// Goods leave stock at each line's originally frozen cost; a
    /// cash-settled receipt pulls the supplier payment back into the
    /// drawer.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyVoided` on repeat, or `InsufficientStock` when the
    /// received goods were already sold on.
    pub async fn void_receipt(
        &self,
        receipt_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> Result<ReceiptWithLines, ReceiptError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let receipt = purchase_receipts::Entity::find_by_id(receipt_id)
            .one(&txn)
            .await?
            .ok_or(ReceiptError::ReceiptNotFound(receipt_id))?;
        DocumentStatus::from(receipt.status).ensure_voidable()?;

        let lines = purchase_receipt_lines::Entity::find()
            .filter(purchase_receipt_lines::Column::ReceiptId.eq(receipt_id))
            .all(&txn)
            .await?;

        for line in &lines {
            StockRepository::outbound_in(
                &txn,
                line.unit_id,
                line.quantity,
                line.unit_cost,
                Some(receipt.number.clone()),
                performed_by,
            )
            .await?;
        }

        let method = match receipt.payment_method_id {
            Some(id) => Some(CatalogRepository::payment_method_in(&txn, id).await?),
            None => None,
        };
        if method.as_ref().is_some_and(|m| m.affects_cash_ledger)
            && receipt.total > Decimal::ZERO
        {
            RegisterRepository::record_in(
                &txn,
                RecordMovementInput {
                    kind: MovementKind::Inflow,
                    amount: receipt.total,
                    memo: Some(format!("Void of receipt {}", receipt.number)),
                    document_ref: Some(receipt.number.clone()),
                    performed_by,
                },
            )
            .await?;
        }

        let number = receipt.number.clone();
        let mut active: purchase_receipts::ActiveModel = receipt.into();
        active.status = Set(DbDocumentStatus::Voided);
        active.voided_at = Set(Some(Utc::now().into()));
        let voided = active.update(&txn).await?;

        txn.commit().await?;
        info!(receipt = %number, "Purchase receipt voided");
        Ok(ReceiptWithLines {
            receipt: voided,
            lines,
        })
    }

    async fn next_number(txn: &DatabaseTransaction) -> Result<String, DbErr> {
        let last = purchase_receipts::Entity::find()
            .order_by_desc(purchase_receipts::Column::Number)
            .limit(1)
            .one(txn)
            .await?
            .map(|receipt| receipt.number);
        Ok(format_number(
            RECEIPT_PREFIX,
            next_sequence(last.as_deref(), RECEIPT_PREFIX),
        ))
    }
}

/// Total of a receipt's lines, rounded to cash scale.
fn receipt_total(lines: &[CostedLine]) -> Decimal {
    let total: Decimal = lines
        .iter()
        .map(|line| line.unit_cost * Decimal::from(line.quantity))
        .sum();
    round_cash(total)
}
