//! Stock ledger error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during stock level operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// Not enough stock on hand for the requested outbound quantity.
    #[error("Insufficient stock for unit {unit_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// The unit being sold or adjusted.
        unit_id: Uuid,
        /// Quantity the operation asked for.
        requested: i32,
        /// Quantity actually on hand.
        available: i32,
    },

    /// Movement quantity must be positive.
    #[error("Stock movement quantity must be positive")]
    NonPositiveQuantity,

    /// Adjustment quantity cannot be zero.
    #[error("Stock adjustment quantity cannot be zero")]
    ZeroAdjustment,

    /// Unit cost cannot be negative.
    #[error("Unit cost cannot be negative")]
    NegativeCost,
}
