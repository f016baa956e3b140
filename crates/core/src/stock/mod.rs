//! Inventory stock logic.
//!
//! This module implements the pure side of the stock ledger:
//! - Per-unit levels carrying on-hand quantity and weighted-average cost
//! - Inbound/outbound/adjustment level math
//! - Cost snapshot resolution for document lines
//! - Error types for stock operations

pub mod costing;
pub mod error;
pub mod level;

#[cfg(test)]
mod level_props;

pub use costing::snapshot_cost;
pub use error::StockError;
pub use level::StockLevel;
