//! Read-only catalog lookups.
//!
//! Units, products, payment methods, clients, and suppliers are maintained
//! elsewhere; the ledgers and orchestrators only consult them.

use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{clients, payment_methods, products, suppliers, units};

/// Errors raised by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Unit not found.
    #[error("Unit not found: {0}")]
    UnitNotFound(Uuid),

    /// Unit exists but is inactive.
    #[error("Unit {0} is inactive")]
    UnitInactive(Uuid),

    /// Payment method not found.
    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(Uuid),

    /// Payment method exists but is inactive.
    #[error("Payment method {0} is inactive")]
    PaymentMethodInactive(Uuid),

    /// Client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Repository for catalog reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active payment method by id.
    pub async fn payment_method(
        &self,
        id: Uuid,
    ) -> Result<payment_methods::Model, CatalogError> {
        Self::payment_method_in(&self.db, id).await
    }

    /// Finds an active unit by id.
    pub async fn unit(&self, id: Uuid) -> Result<units::Model, CatalogError> {
        Self::unit_in(&self.db, id).await
    }

    /// Finds an active payment method on any connection.
    pub async fn payment_method_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<payment_methods::Model, CatalogError> {
        let method = payment_methods::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(CatalogError::PaymentMethodNotFound(id))?;
        if !method.active {
            return Err(CatalogError::PaymentMethodInactive(id));
        }
        Ok(method)
    }

    /// Finds an active unit on any connection.
    pub async fn unit_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<units::Model, CatalogError> {
        let unit = units::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(CatalogError::UnitNotFound(id))?;
        if !unit.active {
            return Err(CatalogError::UnitInactive(id));
        }
        Ok(unit)
    }

    /// Loads a unit together with its product, for cost fallbacks.
    pub async fn unit_with_product_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<(units::Model, Option<products::Model>), CatalogError> {
        let unit = Self::unit_in(conn, id).await?;
        let product = products::Entity::find_by_id(unit.product_id)
            .one(conn)
            .await?;
        Ok((unit, product))
    }

    /// Checks that a client exists.
    pub async fn client_exists_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<(), CatalogError> {
        clients::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|_| ())
            .ok_or(CatalogError::ClientNotFound(id))
    }

    /// Checks that a supplier exists.
    pub async fn supplier_exists_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<(), CatalogError> {
        suppliers::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|_| ())
            .ok_or(CatalogError::SupplierNotFound(id))
    }

    /// Lists active units, optionally filtered by product.
    pub async fn active_units(
        &self,
        product_id: Option<Uuid>,
    ) -> Result<Vec<units::Model>, CatalogError> {
        let mut query = units::Entity::find().filter(units::Column::Active.eq(true));
        if let Some(product_id) = product_id {
            query = query.filter(units::Column::ProductId.eq(product_id));
        }
        Ok(query.all(&self.db).await?)
    }
}
