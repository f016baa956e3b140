//! Purchase receipt routes.

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

use bodega_core::document::CostedLine;
use bodega_db::entities::{purchase_receipt_lines, purchase_receipts};
use bodega_db::repositories::{
    CreateReceiptInput, ReceiptError, ReceiptRepository, ReceiptWithLines,
};

use crate::routes::db_error_response;
use crate::routes::register::cash_error_response;
use crate::routes::sales::{document_error_response, numbering_exhausted_response, VoidRequest};
use crate::routes::stock::{catalog_error_response, stock_rule_response};
use crate::AppState;

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", post(create_receipt))
        .route("/receipts/{receipt_id}/void", post(void_receipt))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A received line as sent by clients.
#[derive(Debug, Deserialize)]
pub struct ReceiptLineRequest {
    /// The unit received.
    pub unit_id: Uuid,
    /// Quantity received.
    pub quantity: i32,
    /// Cost per unit.
    pub unit_cost: Decimal,
}

/// Request body for creating a receipt.
#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    /// Delivering supplier.
    pub supplier_id: Uuid,
    /// Settlement method when paid immediately.
    pub payment_method_id: Option<Uuid>,
    /// Reference to the supplier order being received.
    pub order_reference: Option<String>,
    /// Received lines.
    pub lines: Vec<ReceiptLineRequest>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Response for a receipt.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// Receipt id.
    pub id: Uuid,
    /// Receipt number.
    pub number: String,
    /// Status.
    pub status: String,
    /// Total.
    pub total: String,
    /// Received lines.
    pub lines: Vec<ReceiptLineResponse>,
}

/// Response for a receipt line.
#[derive(Debug, Serialize)]
pub struct ReceiptLineResponse {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity.
    pub quantity: i32,
    /// Frozen unit cost.
    pub unit_cost: String,
}

impl ReceiptResponse {
    fn from_parts(
        receipt: &purchase_receipts::Model,
        lines: &[purchase_receipt_lines::Model],
    ) -> Self {
        Self {
            id: receipt.id,
            number: receipt.number.clone(),
            status: format!("{:?}", receipt.status).to_lowercase(),
            total: receipt.total.to_string(),
            lines: lines
                .iter()
                .map(|line| ReceiptLineResponse {
                    unit_id: line.unit_id,
                    quantity: line.quantity,
                    unit_cost: line.unit_cost.to_string(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/receipts` - Create a purchase receipt.
async fn create_receipt(
    State(state): State<AppState>,
    Json(payload): Json<CreateReceiptRequest>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());
    let input = CreateReceiptInput {
        supplier_id: payload.supplier_id,
        payment_method_id: payload.payment_method_id,
        order_reference: payload.order_reference,
        lines: payload
            .lines
            .iter()
            .map(|line| CostedLine {
                unit_id: line.unit_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            })
            .collect(),
        performed_by: payload.performed_by,
    };
    match repo.create_receipt(input).await {
        Ok(ReceiptWithLines { receipt, lines }) => (
            StatusCode::CREATED,
            Json(json!({ "receipt": ReceiptResponse::from_parts(&receipt, &lines) })),
        )
            .into_response(),
        Err(e) => receipt_error_response(&e, "create receipt"),
    }
}

/// POST `/receipts/{receipt_id}/void` - Void a purchase receipt.
async fn void_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<Uuid>,
    payload: Option<Json<VoidRequest>>,
) -> impl IntoResponse {
    let performed_by = payload.and_then(|Json(p)| p.performed_by);
    let repo = ReceiptRepository::new((*state.db).clone());
    match repo.void_receipt(receipt_id, performed_by).await {
        Ok(ReceiptWithLines { receipt, lines }) => (
            StatusCode::OK,
            Json(json!({ "receipt": ReceiptResponse::from_parts(&receipt, &lines) })),
        )
            .into_response(),
        Err(e) => receipt_error_response(&e, "void receipt"),
    }
}

/// Maps receipt errors to responses.
fn receipt_error_response(err: &ReceiptError, context: &str) -> Response {
    match err {
        ReceiptError::Document(doc) => document_error_response(doc),
        ReceiptError::Stock(stock) => stock_rule_response(stock),
        ReceiptError::Cash(cash) => cash_error_response(cash),
        ReceiptError::Catalog(catalog) => catalog_error_response(catalog),
        ReceiptError::ReceiptNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "receipt_not_found",
                "message": format!("Purchase receipt not found: {id}")
            })),
        )
            .into_response(),
        ReceiptError::NumberingExhausted => numbering_exhausted_response(),
        ReceiptError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}
