//! Return routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use bodega_db::entities::enums::ReturnKind;
use bodega_db::entities::{return_lines, returns};
use bodega_db::repositories::{
    CreateReturnInput, ReturnError, ReturnRepository, ReturnWithLines,
};

use crate::routes::db_error_response;
use crate::routes::register::cash_error_response;
use crate::routes::sales::{
    document_error_response, numbering_exhausted_response, LineRequest, VoidRequest,
};
use crate::routes::stock::{catalog_error_response, stock_rule_response};
use crate::AppState;

/// Creates the return routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/returns", post(create_return))
        .route("/returns/{return_id}/void", post(void_return))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a return.
#[derive(Debug, Deserialize)]
pub struct CreateReturnRequest {
    /// Direction: `sale_return` or `purchase_return`.
    pub kind: ReturnKind,
    /// Returning client (sale returns).
    pub client_id: Option<Uuid>,
    /// Receiving supplier (purchase returns).
    pub supplier_id: Option<Uuid>,
    /// Settlement method when money moves immediately.
    pub payment_method_id: Option<Uuid>,
    /// Returned lines.
    pub lines: Vec<LineRequest>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Response for a return.
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    /// Return id.
    pub id: Uuid,
    /// Return number.
    pub number: String,
    /// Direction.
    pub kind: ReturnKind,
    /// Status.
    pub status: String,
    /// Total.
    pub total: String,
    /// Returned lines.
    pub lines: Vec<ReturnLineResponse>,
}

/// Response for a return line.
#[derive(Debug, Serialize)]
pub struct ReturnLineResponse {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: String,
    /// Frozen unit cost.
    pub unit_cost: String,
}

impl ReturnResponse {
    fn from_parts(document: &returns::Model, lines: &[return_lines::Model]) -> Self {
        Self {
            id: document.id,
            number: document.number.clone(),
            kind: document.kind,
            status: format!("{:?}", document.status).to_lowercase(),
            total: document.total.to_string(),
            lines: lines
                .iter()
                .map(|line| ReturnLineResponse {
                    unit_id: line.unit_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.to_string(),
                    unit_cost: line.unit_cost.to_string(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/returns` - Create a return.
async fn create_return(
    State(state): State<AppState>,
    Json(payload): Json<CreateReturnRequest>,
) -> impl IntoResponse {
    let repo = ReturnRepository::new((*state.db).clone());
    let input = CreateReturnInput {
        kind: payload.kind,
        client_id: payload.client_id,
        supplier_id: payload.supplier_id,
        payment_method_id: payload.payment_method_id,
        lines: payload.lines.iter().map(LineRequest::to_priced_line).collect(),
        performed_by: payload.performed_by,
    };
    match repo.create_return(input).await {
        Ok(ReturnWithLines { document, lines }) => (
            StatusCode::CREATED,
            Json(json!({ "return": ReturnResponse::from_parts(&document, &lines) })),
        )
            .into_response(),
        Err(e) => return_error_response(&e, "create return"),
    }
}

/// POST `/returns/{return_id}/void` - Void a return.
async fn void_return(
    State(state): State<AppState>,
    Path(return_id): Path<Uuid>,
    payload: Option<Json<VoidRequest>>,
) -> impl IntoResponse {
    let performed_by = payload.and_then(|Json(p)| p.performed_by);
    let repo = ReturnRepository::new((*state.db).clone());
    match repo.void_return(return_id, performed_by).await {
        Ok(ReturnWithLines { document, lines }) => (
            StatusCode::OK,
            Json(json!({ "return": ReturnResponse::from_parts(&document, &lines) })),
        )
            .into_response(),
        Err(e) => return_error_response(&e, "void return"),
    }
}

/// Maps return errors to responses.
fn return_error_response(err: &ReturnError, context: &str) -> Response {
    match err {
        ReturnError::Document(doc) => document_error_response(doc),
        ReturnError::Stock(stock) => stock_rule_response(stock),
        ReturnError::Cash(cash) => cash_error_response(cash),
        ReturnError::Catalog(catalog) => catalog_error_response(catalog),
        ReturnError::MissingCounterparty => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_counterparty",
                "message": "A sale return needs a client, a purchase return a supplier"
            })),
        )
            .into_response(),
        ReturnError::ReturnNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "return_not_found",
                "message": format!("Return not found: {id}")
            })),
        )
            .into_response(),
        ReturnError::NumberingExhausted => numbering_exhausted_response(),
        ReturnError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}
