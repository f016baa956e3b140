//! Reservation ledger error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while planning reservation changes.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Not enough unreserved stock to hold the requested quantity.
    #[error(
        "Insufficient availability for unit {unit_id}: available {available}, requested {requested}"
    )]
    InsufficientAvailable {
        /// The unit the order tried to hold.
        unit_id: Uuid,
        /// Quantity the order needs.
        requested: i32,
        /// Quantity not yet held by other orders.
        available: i32,
    },

    /// Reserved quantity must be positive.
    #[error("Reserved quantity must be positive")]
    NonPositiveQuantity,
}
