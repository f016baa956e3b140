//! Stock reservation and availability logic.
//!
//! This module implements the pure side of the reservation ledger:
//! - Availability arithmetic (on hand minus active holds)
//! - Sync planning: turning an order's lines into reservation upserts and
//!   releases, or a shortfall error that leaves everything untouched
//! - Error types for reservation operations

pub mod availability;
pub mod error;
pub mod plan;

pub use availability::available_quantity;
pub use error::ReservationError;
pub use plan::{plan_sync, LineDemand, SyncPlan, UnitAvailability};
