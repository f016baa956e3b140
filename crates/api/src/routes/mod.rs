//! API route definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use sea_orm::DbErr;
use serde_json::json;

use bodega_shared::AppError;

use crate::AppState;

pub mod health;
pub mod orders;
pub mod receipts;
pub mod register;
pub mod returns;
pub mod sales;
pub mod stock;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(register::routes())
        .merge(stock::routes())
        .merge(sales::routes())
        .merge(receipts::routes())
        .merge(returns::routes())
        .merge(orders::routes())
}

/// Maps a database error to a response.
///
/// Serialization conflicts are transient: the caller may retry. Everything
/// else is an opaque 500; the message is never leaked.
pub(crate) fn db_error_response(err: &DbErr) -> Response {
    let app_error = if bodega_db::repositories::is_serialization_failure(err) {
        AppError::Transient("Concurrent update detected".to_string())
    } else {
        AppError::Internal("An error occurred".to_string())
    };
    app_error_response(&app_error)
}

/// Renders an [`AppError`] as a JSON response.
pub(crate) fn app_error_response(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({
        "error": err.error_code().to_lowercase(),
        "message": err.to_string()
    });
    if matches!(err, AppError::Transient(_)) {
        body["retry"] = json!(true);
    }
    (status, Json(body)).into_response()
}
