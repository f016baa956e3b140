//! Order lifecycle error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::state::OrderState;

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested state change is not in the transition table.
    #[error("Invalid order transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state.
        from: OrderState,
        /// Requested state.
        to: OrderState,
    },

    /// A collection would push the paid total above the order total.
    #[error(
        "Payment exceeds order total: total {total}, already paid {net_paid}, requested {requested}"
    )]
    PaymentExceedsTotal {
        /// Order total.
        total: Decimal,
        /// Collections minus refunds so far.
        net_paid: Decimal,
        /// Amount the collection asked for.
        requested: Decimal,
    },

    /// A refund would exceed what has been collected net of prior refunds.
    #[error("Refund exceeds collected amount: available {available}, requested {requested}")]
    RefundExceedsCollected {
        /// Net paid amount still refundable.
        available: Decimal,
        /// Amount the refund asked for.
        requested: Decimal,
    },

    /// A linked refund would exceed its collection's unrefunded remainder.
    #[error(
        "Refund exceeds the linked collection's remainder: available {available}, requested {requested}"
    )]
    RefundExceedsCollection {
        /// Unrefunded remainder of the linked collection.
        available: Decimal,
        /// Amount the refund asked for.
        requested: Decimal,
    },

    /// The referenced collection does not exist on this order.
    #[error("Linked collection {0} not found on this order")]
    LinkedCollectionNotFound(Uuid),

    /// Payment amount must be positive.
    #[error("Payment amount must be positive")]
    NonPositiveAmount,
}
