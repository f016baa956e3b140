//! Stock availability and adjustment routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use bodega_core::reservation::ReservationError;
use bodega_core::stock::StockError;
use bodega_db::repositories::{CatalogError, StockLedgerError, StockRepository};

use crate::routes::db_error_response;
use crate::AppState;

/// Creates the stock routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/availability/{unit_id}", get(availability))
        .route("/stock/availability/batch", post(availability_batch))
        .route("/stock/adjustments", post(apply_adjustment))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for single-unit availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Order whose own holds should be added back.
    pub excluding_order: Option<Uuid>,
}

/// Request body for batch availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityBatchRequest {
    /// Units to report on.
    pub unit_ids: Vec<Uuid>,
}

/// Request body for a manual stock adjustment.
#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    /// The unit to adjust.
    pub unit_id: Uuid,
    /// Signed quantity: positive into stock, negative out.
    pub quantity: i32,
    /// Why the adjustment was made.
    pub reason: Option<String>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/stock/availability/{unit_id}` - Availability of one unit.
async fn availability(
    State(state): State<AppState>,
    Path(unit_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> impl IntoResponse {
    let repo = StockRepository::new((*state.db).clone());
    match repo.availability(unit_id, query.excluding_order).await {
        Ok(view) => (StatusCode::OK, Json(json!({ "availability": view }))).into_response(),
        Err(e) => stock_error_response(&e, "query availability"),
    }
}

/// POST `/stock/availability/batch` - Availability of a batch of units.
async fn availability_batch(
    State(state): State<AppState>,
    Json(payload): Json<AvailabilityBatchRequest>,
) -> impl IntoResponse {
    let repo = StockRepository::new((*state.db).clone());
    match repo.availability_batch(&payload.unit_ids).await {
        Ok(views) => (StatusCode::OK, Json(json!({ "availability": views }))).into_response(),
        Err(e) => stock_error_response(&e, "query availability batch"),
    }
}

/// POST `/stock/adjustments` - Apply a signed manual adjustment.
async fn apply_adjustment(
    State(state): State<AppState>,
    Json(payload): Json<AdjustmentRequest>,
) -> impl IntoResponse {
    let repo = StockRepository::new((*state.db).clone());
    match repo
        .apply_adjustment(
            payload.unit_id,
            payload.quantity,
            payload.reason,
            payload.performed_by,
        )
        .await
    {
        Ok(view) => (StatusCode::OK, Json(json!({ "availability": view }))).into_response(),
        Err(e) => stock_error_response(&e, "apply adjustment"),
    }
}

/// Maps stock ledger errors to responses.
pub(crate) fn stock_error_response(err: &StockLedgerError, context: &str) -> Response {
    match err {
        StockLedgerError::Stock(stock) => stock_rule_response(stock),
        StockLedgerError::Catalog(catalog) => catalog_error_response(catalog),
        StockLedgerError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}

/// Maps stock rule violations to responses.
pub(crate) fn stock_rule_response(err: &StockError) -> Response {
    let (status, body) = match err {
        StockError::InsufficientStock {
            unit_id,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "insufficient_stock",
                "message": err.to_string(),
                "unit_id": unit_id,
                "requested": requested,
                "available": available
            }),
        ),
        StockError::NonPositiveQuantity
        | StockError::ZeroAdjustment
        | StockError::NegativeCost => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "invalid_stock_movement",
                "message": err.to_string()
            }),
        ),
    };
    (status, Json(body)).into_response()
}

/// Maps reservation rule violations to responses.
pub(crate) fn reservation_error_response(err: &ReservationError) -> Response {
    let (status, body) = match err {
        ReservationError::InsufficientAvailable {
            unit_id,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "insufficient_available",
                "message": err.to_string(),
                "unit_id": unit_id,
                "requested": requested,
                "available": available
            }),
        ),
        ReservationError::NonPositiveQuantity => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "invalid_reservation",
                "message": err.to_string()
            }),
        ),
    };
    (status, Json(body)).into_response()
}

/// Maps catalog lookup failures to responses.
pub(crate) fn catalog_error_response(err: &CatalogError) -> Response {
    let (status, code) = match err {
        CatalogError::UnitNotFound(_)
        | CatalogError::PaymentMethodNotFound(_)
        | CatalogError::ClientNotFound(_)
        | CatalogError::SupplierNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CatalogError::UnitInactive(_) | CatalogError::PaymentMethodInactive(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "inactive")
        }
        CatalogError::Database(db) => {
            error!(error = %db, "Catalog lookup failed");
            return db_error_response(db);
        }
    };
    (
        status,
        Json(json!({
            "error": code,
            "message": err.to_string()
        })),
    )
        .into_response()
}
