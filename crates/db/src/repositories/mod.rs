//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every check-then-write against a shared balance (cash sufficiency, stock
//! sufficiency, reservation availability) runs under serializable isolation
//! and is re-validated inside the deciding transaction; no in-process locks
//! are used.

pub mod catalog;
pub mod numbering;
pub mod order;
pub mod receipt;
pub mod register;
pub mod reservation;
pub mod returns;
pub mod sale;
pub mod stock;

pub use catalog::{CatalogError, CatalogRepository};
pub use order::{
    CreateOrderInput, OrderDetail, OrderError, OrderRepository, PaymentInput, RefundInput,
};
pub use receipt::{CreateReceiptInput, ReceiptError, ReceiptRepository, ReceiptWithLines};
pub use register::{
    RecordMovementInput, RegisterError, RegisterRepository, SessionState,
};
pub use reservation::{ReservationLedgerError, ReservationRepository};
pub use returns::{CreateReturnInput, ReturnError, ReturnRepository, ReturnWithLines};
pub use sale::{CreateSaleInput, SaleError, SaleRepository, SaleWithLines};
pub use stock::{StockLedgerError, StockRepository, UnitAvailabilityView};

use sea_orm::{DbErr, SqlErr};

/// True when the error is a unique-key collision.
///
/// Document numbering treats these as retryable with a fresh candidate.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// True when the error is a serialization conflict between concurrent
/// transactions.
///
/// These are transient; callers may retry the whole operation.
#[must_use]
pub fn is_serialization_failure(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("could not serialize access") || message.contains("40001")
}
