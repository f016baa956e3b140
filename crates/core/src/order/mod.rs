//! Customer order lifecycle logic.
//!
//! This module implements the pure side of the order coordinator:
//! - The order state machine as a single transition table
//! - Entry effects each transition requires (sync, release, deliver)
//! - Payment and refund invariants over an append-only event list
//! - Error types for lifecycle operations

pub mod error;
pub mod payment;
pub mod state;

pub use error::LifecycleError;
pub use payment::{
    collection_remaining, net_paid, validate_collection, validate_refund, PaymentEvent,
    PaymentKind,
};
pub use state::{
    payment_auto_advance, plan_transition, refund_auto_revert, OrderState, TransitionEffect,
};
