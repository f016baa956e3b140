//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Repositories own all transactional behavior: every check-then-write
//! against a shared balance runs under serializable isolation and is
//! re-validated inside the deciding transaction.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    CatalogRepository, OrderRepository, ReceiptRepository, RegisterRepository,
    ReservationRepository, ReturnRepository, SaleRepository, StockRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
