//! Customer order routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use bodega_core::order::{LifecycleError, OrderState};
use bodega_db::entities::customer_orders;
use bodega_db::entities::enums::OrderStatus;
use bodega_db::repositories::{
    CreateOrderInput, OrderDetail, OrderError, OrderRepository, PaymentInput, RefundInput,
};

use crate::routes::db_error_response;
use crate::routes::register::cash_error_response;
use crate::routes::sales::{
    document_error_response, numbering_exhausted_response, LineRequest,
};
use crate::routes::stock::{
    catalog_error_response, reservation_error_response, stock_rule_response,
};
use crate::AppState;

/// Creates the order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{order_id}", get(get_order))
        .route("/orders/{order_id}/state", post(change_state))
        .route("/orders/{order_id}/payments", post(add_payment))
        .route("/orders/{order_id}/refunds", post(add_refund))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Ordering client.
    pub client_id: Option<Uuid>,
    /// Whether the order holds stock while active. Defaults to true.
    #[serde(default = "default_reserves_stock")]
    pub reserves_stock: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Order lines.
    pub lines: Vec<LineRequest>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

const fn default_reserves_stock() -> bool {
    true
}

/// Request body for a state change.
#[derive(Debug, Deserialize)]
pub struct ChangeStateRequest {
    /// Target state.
    pub state: OrderState,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Request body for a collection.
#[derive(Debug, Deserialize)]
pub struct AddPaymentRequest {
    /// Amount collected.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// External reference when the method demands one.
    pub reference: Option<String>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Request body for a refund.
#[derive(Debug, Deserialize)]
pub struct AddRefundRequest {
    /// Amount returned.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method_id: Uuid,
    /// External reference.
    pub reference: Option<String>,
    /// The collection being unwound, if linked.
    pub refund_of: Option<Uuid>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Response for an order header.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order id.
    pub id: Uuid,
    /// Order number.
    pub number: String,
    /// Lifecycle state.
    pub state: OrderStatus,
    /// Whether the order holds stock while active.
    pub reserves_stock: bool,
    /// Order total.
    pub total: String,
}

impl OrderResponse {
    fn from_model(order: &customer_orders::Model) -> Self {
        Self {
            id: order.id,
            number: order.number.clone(),
            state: order.status,
            reserves_stock: order.reserves_stock,
            total: order.total.to_string(),
        }
    }
}

/// Full order detail response.
#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    /// Order header.
    #[serde(flatten)]
    pub order: OrderResponse,
    /// Order lines.
    pub lines: Vec<OrderLineResponse>,
    /// Payment events, oldest first.
    pub payments: Vec<OrderPaymentResponse>,
    /// Active reservations.
    pub reservations: Vec<OrderReservationResponse>,
}

/// Response for an order line.
#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: String,
    /// Discount per unit.
    pub discount: String,
}

/// Response for a payment event.
#[derive(Debug, Serialize)]
pub struct OrderPaymentResponse {
    /// Event id.
    pub id: Uuid,
    /// `collection` or `refund`.
    pub kind: String,
    /// Amount.
    pub amount: String,
    /// The collection being unwound, for linked refunds.
    pub refund_of: Option<Uuid>,
}

/// Response for a reservation row.
#[derive(Debug, Serialize)]
pub struct OrderReservationResponse {
    /// The held unit.
    pub unit_id: Uuid,
    /// Held quantity.
    pub quantity: i32,
}

impl OrderDetailResponse {
    fn from_detail(detail: &OrderDetail) -> Self {
        Self {
            order: OrderResponse::from_model(&detail.order),
            lines: detail
                .lines
                .iter()
                .map(|line| OrderLineResponse {
                    unit_id: line.unit_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.to_string(),
                    discount: line.discount.to_string(),
                })
                .collect(),
            payments: detail
                .payments
                .iter()
                .map(|payment| OrderPaymentResponse {
                    id: payment.id,
                    kind: format!("{:?}", payment.kind).to_lowercase(),
                    amount: payment.amount.to_string(),
                    refund_of: payment.refund_of,
                })
                .collect(),
            reservations: detail
                .reservations
                .iter()
                .map(|reservation| OrderReservationResponse {
                    unit_id: reservation.unit_id,
                    quantity: reservation.quantity,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/orders` - Create a draft order.
async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    let repo = OrderRepository::new((*state.db).clone());
    let input = CreateOrderInput {
        client_id: payload.client_id,
        reserves_stock: payload.reserves_stock,
        notes: payload.notes,
        lines: payload.lines.iter().map(LineRequest::to_priced_line).collect(),
        performed_by: payload.performed_by,
    };
    match repo.create_order(input).await {
        Ok(detail) => (
            StatusCode::CREATED,
            Json(json!({ "order": OrderDetailResponse::from_detail(&detail) })),
        )
            .into_response(),
        Err(e) => order_error_response(&e, "create order"),
    }
}

/// GET `/orders/{order_id}` - Load an order with its dependent rows.
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = OrderRepository::new((*state.db).clone());
    match repo.get_order(order_id).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(json!({ "order": OrderDetailResponse::from_detail(&detail) })),
        )
            .into_response(),
        Err(e) => order_error_response(&e, "get order"),
    }
}

/// POST `/orders/{order_id}/state` - Apply a state change.
async fn change_state(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ChangeStateRequest>,
) -> impl IntoResponse {
    let repo = OrderRepository::new((*state.db).clone());
    match repo
        .change_state(order_id, payload.state, payload.performed_by)
        .await
    {
        Ok(order) => (
            StatusCode::OK,
            Json(json!({ "order": OrderResponse::from_model(&order) })),
        )
            .into_response(),
        Err(e) => order_error_response(&e, "change order state"),
    }
}

/// POST `/orders/{order_id}/payments` - Record a collection.
async fn add_payment(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddPaymentRequest>,
) -> impl IntoResponse {
    let repo = OrderRepository::new((*state.db).clone());
    let input = PaymentInput {
        amount: payload.amount,
        payment_method_id: payload.payment_method_id,
        reference: payload.reference,
        performed_by: payload.performed_by,
    };
    match repo.add_payment(order_id, input).await {
        Ok((payment, order)) => (
            StatusCode::CREATED,
            Json(json!({
                "payment_id": payment.id,
                "amount": payment.amount.to_string(),
                "order": OrderResponse::from_model(&order)
            })),
        )
            .into_response(),
        Err(e) => order_error_response(&e, "add payment"),
    }
}

/// POST `/orders/{order_id}/refunds` - Record a refund.
async fn add_refund(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddRefundRequest>,
) -> impl IntoResponse {
    let repo = OrderRepository::new((*state.db).clone());
    let input = RefundInput {
        amount: payload.amount,
        payment_method_id: payload.payment_method_id,
        reference: payload.reference,
        refund_of: payload.refund_of,
        performed_by: payload.performed_by,
    };
    match repo.add_refund(order_id, input).await {
        Ok((refund, order)) => (
            StatusCode::CREATED,
            Json(json!({
                "refund_id": refund.id,
                "amount": refund.amount.to_string(),
                "order": OrderResponse::from_model(&order)
            })),
        )
            .into_response(),
        Err(e) => order_error_response(&e, "add refund"),
    }
}

/// Maps order errors to responses.
fn order_error_response(err: &OrderError, context: &str) -> Response {
    match err {
        OrderError::Lifecycle(lifecycle) => lifecycle_error_response(lifecycle),
        OrderError::Document(doc) => document_error_response(doc),
        OrderError::Reservation(res) => reservation_error_response(res),
        OrderError::Stock(stock) => stock_rule_response(stock),
        OrderError::Cash(cash) => cash_error_response(cash),
        OrderError::Catalog(catalog) => catalog_error_response(catalog),
        OrderError::MissingReference => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_reference",
                "message": "Payment method requires a reference"
            })),
        )
            .into_response(),
        OrderError::OrderNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "order_not_found",
                "message": format!("Order not found: {id}")
            })),
        )
            .into_response(),
        OrderError::NumberingExhausted => numbering_exhausted_response(),
        OrderError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}

/// Maps lifecycle rule violations to responses.
fn lifecycle_error_response(err: &LifecycleError) -> Response {
    let (status, body) = match err {
        LifecycleError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            json!({
                "error": "invalid_transition",
                "message": err.to_string(),
                "from": from,
                "to": to
            }),
        ),
        LifecycleError::PaymentExceedsTotal {
            total,
            net_paid,
            requested,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "payment_exceeds_total",
                "message": err.to_string(),
                "total": total.to_string(),
                "net_paid": net_paid.to_string(),
                "requested": requested.to_string()
            }),
        ),
        LifecycleError::RefundExceedsCollected {
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "refund_exceeds_collected",
                "message": err.to_string(),
                "available": available.to_string(),
                "requested": requested.to_string()
            }),
        ),
        LifecycleError::RefundExceedsCollection {
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "refund_exceeds_collection",
                "message": err.to_string(),
                "available": available.to_string(),
                "requested": requested.to_string()
            }),
        ),
        LifecycleError::LinkedCollectionNotFound(id) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "linked_collection_not_found",
                "message": format!("Linked collection {id} not found on this order")
            }),
        ),
        LifecycleError::NonPositiveAmount => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "invalid_amount",
                "message": "Payment amount must be positive"
            }),
        ),
    };
    (status, Json(body)).into_response()
}
