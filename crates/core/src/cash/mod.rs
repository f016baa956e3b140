//! Cash register ledger logic.
//!
//! This module implements the pure side of the cash ledger:
//! - Movement kinds and their inflow/outflow classification
//! - Session balance calculation over an append-only movement list
//! - Amount validation and overdraft checks
//! - Error types for cash operations

pub mod balance;
pub mod error;
pub mod types;

#[cfg(test)]
mod balance_props;

pub use balance::{check_outflow, session_balance, validate_amount};
pub use error::CashError;
pub use types::{CashMovement, Flow, MovementKind};
