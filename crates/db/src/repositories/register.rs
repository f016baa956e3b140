//! Cash register repository.
//!
//! Owns register sessions and the append-only cash movement ledger. The
//! overdraft guard re-reads and re-sums the open session's movements inside
//! the deciding transaction, under serializable isolation, immediately
//! before appending; two concurrent outflows can therefore never both pass
//! a sufficiency check against a stale balance.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use bodega_core::cash::{
    check_outflow, session_balance, validate_amount, CashError, CashMovement, Flow, MovementKind,
};
use bodega_shared::types::round_cash;

use crate::entities::{cash_movements, register_sessions};

/// Errors raised by cash register operations.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// A cash ledger rule was violated.
    #[error(transparent)]
    Cash(#[from] CashError),

    /// Opening float cannot be negative.
    #[error("Opening float cannot be negative")]
    NegativeOpeningFloat,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Snapshot of the register state for display.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Whether a session is currently open.
    pub open: bool,
    /// The open session, if any.
    pub session: Option<register_sessions::Model>,
    /// Balance of the open session, zero when closed.
    pub balance: Decimal,
}

/// Input for recording a cash movement.
#[derive(Debug, Clone)]
pub struct RecordMovementInput {
    /// The movement kind.
    pub kind: MovementKind,
    /// Amount; signed only for adjustments.
    pub amount: Decimal,
    /// Free-form note.
    pub memo: Option<String>,
    /// Number of the document that caused the movement.
    pub document_ref: Option<String>,
    /// Acting user, for audit.
    pub performed_by: Option<Uuid>,
}

/// Repository for register sessions and cash movements.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    db: DatabaseConnection,
}

impl RegisterRepository {
    /// Creates a new register repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the current register state: open flag, session, balance.
    ///
    /// Read-only; runs at default isolation and may be stale for display.
    pub async fn session_state(&self) -> Result<SessionState, RegisterError> {
        let Some(session) = Self::find_open(&self.db).await? else {
            return Ok(SessionState {
                open: false,
                session: None,
                balance: Decimal::ZERO,
            });
        };

        let balance = Self::balance_in(&self.db, &session).await?;
        Ok(SessionState {
            open: true,
            session: Some(session),
            balance,
        })
    }

    /// Opens a new register session with an opening float.
    ///
    /// The single-open-session invariant is checked inside a serializable
    /// transaction (and backed by a partial unique index).
    ///
    /// # Errors
    ///
    /// Returns `SessionAlreadyOpen` when a session is open,
    /// `NegativeOpeningFloat` on invalid input.
    pub async fn open_session(
        &self,
        opening_float: Decimal,
        cashier: String,
        performed_by: Option<Uuid>,
    ) -> Result<register_sessions::Model, RegisterError> {
        if opening_float.is_sign_negative() {
            return Err(RegisterError::NegativeOpeningFloat);
        }
        let opening_float = round_cash(opening_float);

        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        if Self::find_open(&txn).await?.is_some() {
            return Err(CashError::SessionAlreadyOpen.into());
        }

        let now = Utc::now().into();
        let session = register_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            opened_at: Set(now),
            closed_at: Set(None),
            opening_float: Set(opening_float),
            declared_closing_amount: Set(None),
            cashier: Set(cashier),
        }
        .insert(&txn)
        .await?;

        if opening_float > Decimal::ZERO {
            Self::append(
                &txn,
                session.id,
                MovementKind::OpeningDeposit,
                opening_float,
                Some("Opening float".to_string()),
                None,
                performed_by,
            )
            .await?;
        }

        txn.commit().await?;
        info!(session_id = %session.id, %opening_float, "Register session opened");
        Ok(session)
    }

    /// Closes the open session, recording the declared drawer count.
    ///
    /// The remaining balance leaves the drawer as a closing withdrawal so
    /// the session ends at zero.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenSession` when no session is open.
    pub async fn close_session(
        &self,
        declared_closing_amount: Option<Decimal>,
        performed_by: Option<Uuid>,
    ) -> Result<register_sessions::Model, RegisterError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let session = Self::find_open(&txn)
            .await?
            .ok_or(CashError::NoOpenSession)?;

        let balance = Self::balance_in(&txn, &session).await?;
        if balance > Decimal::ZERO {
            Self::append(
                &txn,
                session.id,
                MovementKind::ClosingWithdrawal,
                balance,
                Some("Closing withdrawal".to_string()),
                None,
                performed_by,
            )
            .await?;
        }

        let session_id = session.id;
        let mut active: register_sessions::ActiveModel = session.into();
        active.closed_at = Set(Some(Utc::now().into()));
        active.declared_closing_amount = Set(declared_closing_amount.map(round_cash));
        let closed = active.update(&txn).await?;

        txn.commit().await?;
        info!(session_id = %session_id, %balance, "Register session closed");
        Ok(closed)
    }

    /// Records a cash movement in its own serializable transaction.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenSession` when no session is open, or
    /// `InsufficientFunds` when an outflow-like amount exceeds the balance
    /// re-computed inside the transaction. Nothing is persisted on failure.
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<cash_movements::Model, RegisterError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;
        let movement = Self::record_in(&txn, input).await?;
        txn.commit().await?;
        Ok(movement)
    }

    /// Records a cash movement inside the caller's transaction.
    ///
    /// Orchestrators call this so a cash failure rolls back their whole
    /// unit of work. The session is re-read and its movements re-summed on
    /// this connection before deciding.
    pub async fn record_in(
        txn: &DatabaseTransaction,
        input: RecordMovementInput,
    ) -> Result<cash_movements::Model, RegisterError> {
        let amount = validate_amount(input.kind, input.amount)?;

        let session = Self::find_open(txn)
            .await?
            .ok_or(CashError::NoOpenSession)?;

        if let Flow::Outflow(outgoing) = input.kind.flow(amount) {
            let balance = Self::balance_in(txn, &session).await?;
            check_outflow(balance, outgoing)?;
        }

        Self::append(
            txn,
            session.id,
            input.kind,
            amount,
            input.memo,
            input.document_ref,
            input.performed_by,
        )
        .await
    }

    /// Finds the open session, if any, on the given connection.
    pub async fn find_open<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Option<register_sessions::Model>, DbErr> {
        register_sessions::Entity::find()
            .filter(register_sessions::Column::ClosedAt.is_null())
            .one(conn)
            .await
    }

    /// Computes a session's balance from its movement history.
    async fn balance_in<C: ConnectionTrait>(
        conn: &C,
        session: &register_sessions::Model,
    ) -> Result<Decimal, DbErr> {
        let rows = cash_movements::Entity::find()
            .filter(cash_movements::Column::SessionId.eq(session.id))
            .order_by_asc(cash_movements::Column::OccurredAt)
            .all(conn)
            .await?;

        let movements: Vec<CashMovement> = rows
            .iter()
            .map(|row| CashMovement::new(row.kind.into(), row.amount))
            .collect();

        // The opening float is already a movement; fold from zero.
        Ok(session_balance(Decimal::ZERO, &movements))
    }

    async fn append(
        txn: &impl ConnectionTrait,
        session_id: Uuid,
        kind: MovementKind,
        amount: Decimal,
        memo: Option<String>,
        document_ref: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<cash_movements::Model, RegisterError> {
        let movement = cash_movements::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            occurred_at: Set(Utc::now().into()),
            kind: Set(kind.into()),
            amount: Set(amount),
            memo: Set(memo),
            document_ref: Set(document_ref),
            performed_by: Set(performed_by),
        }
        .insert(txn)
        .await?;
        Ok(movement)
    }
}
