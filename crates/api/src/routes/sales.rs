//! Sale routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use bodega_core::document::{DocumentError, PricedLine};
use bodega_db::entities::{sale_lines, sales};
use bodega_db::repositories::{CreateSaleInput, SaleError, SaleRepository, SaleWithLines};

use crate::routes::db_error_response;
use crate::routes::register::cash_error_response;
use crate::routes::stock::{
    catalog_error_response, reservation_error_response, stock_rule_response,
};
use crate::AppState;

/// Creates the sale routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(create_sale))
        .route("/sales/{sale_id}/void", post(void_sale))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A priced document line as sent by clients.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    /// The unit being moved.
    pub unit_id: Uuid,
    /// Quantity.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Discount per unit.
    #[serde(default)]
    pub discount: Decimal,
}

impl LineRequest {
    /// Converts to the core line shape.
    pub(crate) fn to_priced_line(&self) -> PricedLine {
        PricedLine {
            unit_id: self.unit_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
        }
    }
}

/// Request body for creating a sale.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    /// Buying client.
    pub client_id: Option<Uuid>,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// Sale lines.
    pub lines: Vec<LineRequest>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Request body for voiding.
#[derive(Debug, Default, Deserialize)]
pub struct VoidRequest {
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Response for a sale.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    /// Sale id.
    pub id: Uuid,
    /// Sale number.
    pub number: String,
    /// Status.
    pub status: String,
    /// Total.
    pub total: String,
    /// Lines with frozen costs.
    pub lines: Vec<SaleLineResponse>,
}

/// Response for a sale line.
#[derive(Debug, Serialize)]
pub struct SaleLineResponse {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: String,
    /// Discount per unit.
    pub discount: String,
    /// Frozen unit cost.
    pub unit_cost: String,
}

impl SaleResponse {
    fn from_parts(sale: &sales::Model, lines: &[sale_lines::Model]) -> Self {
        Self {
            id: sale.id,
            number: sale.number.clone(),
            status: format!("{:?}", sale.status).to_lowercase(),
            total: sale.total.to_string(),
            lines: lines
                .iter()
                .map(|line| SaleLineResponse {
                    unit_id: line.unit_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.to_string(),
                    discount: line.discount.to_string(),
                    unit_cost: line.unit_cost.to_string(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/sales` - Create a sale.
async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> impl IntoResponse {
    let repo = SaleRepository::new((*state.db).clone());
    let input = CreateSaleInput {
        client_id: payload.client_id,
        payment_method_id: payload.payment_method_id,
        lines: payload.lines.iter().map(LineRequest::to_priced_line).collect(),
        performed_by: payload.performed_by,
    };
    match repo.create_sale(input).await {
        Ok(SaleWithLines { sale, lines }) => (
            StatusCode::CREATED,
            Json(json!({ "sale": SaleResponse::from_parts(&sale, &lines) })),
        )
            .into_response(),
        Err(e) => sale_error_response(&e, "create sale"),
    }
}

/// POST `/sales/{sale_id}/void` - Void a sale.
async fn void_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
    payload: Option<Json<VoidRequest>>,
) -> impl IntoResponse {
    let performed_by = payload.and_then(|Json(p)| p.performed_by);
    let repo = SaleRepository::new((*state.db).clone());
    match repo.void_sale(sale_id, performed_by).await {
        Ok(SaleWithLines { sale, lines }) => (
            StatusCode::OK,
            Json(json!({ "sale": SaleResponse::from_parts(&sale, &lines) })),
        )
            .into_response(),
        Err(e) => sale_error_response(&e, "void sale"),
    }
}

/// Maps sale errors to responses.
fn sale_error_response(err: &SaleError, context: &str) -> Response {
    match err {
        SaleError::Document(doc) => document_error_response(doc),
        SaleError::Availability(res) => reservation_error_response(res),
        SaleError::Stock(stock) => stock_rule_response(stock),
        SaleError::Cash(cash) => cash_error_response(cash),
        SaleError::Catalog(catalog) => catalog_error_response(catalog),
        SaleError::SaleNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "sale_not_found",
                "message": format!("Sale not found: {id}")
            })),
        )
            .into_response(),
        SaleError::NumberingExhausted => numbering_exhausted_response(),
        SaleError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}

/// Maps document validation and status failures to responses.
pub(crate) fn document_error_response(err: &DocumentError) -> Response {
    let status = match err {
        DocumentError::AlreadyVoided => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    let code = match err {
        DocumentError::AlreadyVoided => "already_voided",
        _ => "invalid_lines",
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

/// Response for exhausted document numbering retries.
pub(crate) fn numbering_exhausted_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "numbering_exhausted",
            "message": "Could not allocate a document number, retry the request",
            "retry": true
        })),
    )
        .into_response()
}
