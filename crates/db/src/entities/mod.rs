//! `SeaORM` entity definitions.
//!
//! Entities mirror the persisted layout one table per module. Cross-entity
//! references are plain foreign-key columns; repositories look related rows
//! up explicitly.

pub mod enums;

pub mod cash_movements;
pub mod clients;
pub mod customer_orders;
pub mod inventory_movements;
pub mod order_lines;
pub mod order_payments;
pub mod payment_methods;
pub mod products;
pub mod purchase_receipt_lines;
pub mod purchase_receipts;
pub mod register_sessions;
pub mod reservations;
pub mod return_lines;
pub mod returns;
pub mod sale_lines;
pub mod sales;
pub mod stock_units;
pub mod suppliers;
pub mod units;
