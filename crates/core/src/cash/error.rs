//! Cash ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during cash ledger operations.
#[derive(Debug, Error)]
pub enum CashError {
    /// No register session is currently open.
    #[error("No open register session")]
    NoOpenSession,

    /// A register session is already open.
    #[error("A register session is already open")]
    SessionAlreadyOpen,

    /// The drawer does not hold enough cash for the requested outflow.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance available in the open session.
        available: Decimal,
        /// Amount the movement asked to pay out.
        requested: Decimal,
    },

    /// Movement amount must be positive.
    #[error("Movement amount must be positive")]
    NonPositiveAmount,

    /// Adjustment amount cannot be zero.
    #[error("Adjustment amount cannot be zero")]
    ZeroAdjustment,
}
