//! Cash register routes.

use axum::{
    extract::State,
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

use bodega_core::cash::{CashError, MovementKind};
use bodega_db::repositories::{RecordMovementInput, RegisterError, RegisterRepository};

use crate::routes::db_error_response;
use crate::AppState;

/// Creates the register routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register/session", get(session_state))
        .route("/register/sessions", post(open_session))
        .route("/register/sessions/close", post(close_session))
        .route("/register/movements", post(record_movement))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for opening a session.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Cash placed in the drawer.
    pub opening_float: Decimal,
    /// Cashier label.
    pub cashier: String,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Request body for closing the open session.
#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    /// Cash counted in the drawer at close.
    pub declared_closing_amount: Option<Decimal>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Request body for recording a movement.
#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount; signed only for adjustments.
    pub amount: Decimal,
    /// Free-form note.
    pub memo: Option<String>,
    /// Related document number.
    pub document_ref: Option<String>,
    /// Acting user.
    pub performed_by: Option<Uuid>,
}

/// Response for the register state.
#[derive(Debug, Serialize)]
pub struct SessionStateResponse {
    /// Whether a session is open.
    pub open: bool,
    /// Open session id.
    pub session_id: Option<Uuid>,
    /// Session opening time.
    pub opened_at: Option<String>,
    /// Cashier label.
    pub cashier: Option<String>,
    /// Current balance.
    pub balance: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/register/session` - Current register state and balance.
async fn session_state(State(state): State<AppState>) -> impl IntoResponse {
    let repo = RegisterRepository::new((*state.db).clone());
    match repo.session_state().await {
        Ok(state) => {
            let session = state.session;
            (
                StatusCode::OK,
                Json(SessionStateResponse {
                    open: state.open,
                    session_id: session.as_ref().map(|s| s.id),
                    opened_at: session.as_ref().map(|s| s.opened_at.to_rfc3339()),
                    cashier: session.map(|s| s.cashier),
                    balance: state.balance.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => register_error_response(&e, "query session state"),
    }
}

/// POST `/register/sessions` - Open a session.
async fn open_session(
    State(state): State<AppState>,
    Json(payload): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    let repo = RegisterRepository::new((*state.db).clone());
    match repo
        .open_session(payload.opening_float, payload.cashier, payload.performed_by)
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(json!({
                "session_id": session.id,
                "opened_at": session.opened_at.to_rfc3339(),
                "opening_float": session.opening_float.to_string()
            })),
        )
            .into_response(),
        Err(e) => register_error_response(&e, "open session"),
    }
}

/// POST `/register/sessions/close` - Close the open session.
async fn close_session(
    State(state): State<AppState>,
    Json(payload): Json<CloseSessionRequest>,
) -> impl IntoResponse {
    let repo = RegisterRepository::new((*state.db).clone());
    match repo
        .close_session(payload.declared_closing_amount, payload.performed_by)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({
                "session_id": session.id,
                "closed_at": session.closed_at.map(|t| t.to_rfc3339()),
                "declared_closing_amount":
                    session.declared_closing_amount.map(|a| a.to_string())
            })),
        )
            .into_response(),
        Err(e) => register_error_response(&e, "close session"),
    }
}

/// POST `/register/movements` - Record a cash movement.
async fn record_movement(
    State(state): State<AppState>,
    Json(payload): Json<RecordMovementRequest>,
) -> impl IntoResponse {
    let repo = RegisterRepository::new((*state.db).clone());
    let input = RecordMovementInput {
        kind: payload.kind,
        amount: payload.amount,
        memo: payload.memo,
        document_ref: payload.document_ref,
        performed_by: payload.performed_by,
    };
    match repo.record_movement(input).await {
        Ok(movement) => (
            StatusCode::CREATED,
            Json(json!({
                "movement_id": movement.id,
                "session_id": movement.session_id,
                "amount": movement.amount.to_string()
            })),
        )
            .into_response(),
        Err(e) => register_error_response(&e, "record movement"),
    }
}

/// Maps register errors to responses.
pub(crate) fn register_error_response(err: &RegisterError, context: &str) -> Response {
    match err {
        RegisterError::Cash(cash) => cash_error_response(cash),
        RegisterError::NegativeOpeningFloat => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "negative_opening_float",
                "message": "Opening float cannot be negative"
            })),
        )
            .into_response(),
        RegisterError::Database(db) => {
            error!(error = %db, "Failed to {context}");
            db_error_response(db)
        }
    }
}

/// Maps cash ledger rule violations to responses.
pub(crate) fn cash_error_response(err: &CashError) -> Response {
    let (status, body) = match err {
        CashError::NoOpenSession => (
            StatusCode::CONFLICT,
            json!({
                "error": "no_open_session",
                "message": "No register session is open"
            }),
        ),
        CashError::SessionAlreadyOpen => (
            StatusCode::CONFLICT,
            json!({
                "error": "session_already_open",
                "message": "A register session is already open"
            }),
        ),
        CashError::InsufficientFunds {
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": "insufficient_funds",
                "message": err.to_string(),
                "available": available.to_string(),
                "requested": requested.to_string()
            }),
        ),
        CashError::NonPositiveAmount | CashError::ZeroAdjustment => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "invalid_amount",
                "message": err.to_string()
            }),
        ),
    };
    (status, Json(body)).into_response()
}
