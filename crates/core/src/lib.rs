//! Core business logic for Bodega.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `cash` - Cash register session balance and movement classification
//! - `stock` - Weighted-average inventory levels and cost snapshots
//! - `reservation` - Stock availability and reservation sync planning
//! - `order` - Customer order lifecycle and payment invariants
//! - `document` - Document status rules and line validation

pub mod cash;
pub mod document;
pub mod order;
pub mod reservation;
pub mod stock;
