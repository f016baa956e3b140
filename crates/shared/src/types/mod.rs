//! Common types used across the application.

pub mod money;

pub use money::{round_cash, round_cost, CASH_SCALE, COST_SCALE};
