//! HTTP error mapping for core errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use burnout_core::BurnoutError;

/// Wraps [`BurnoutError`] so handlers can `?` core results straight into a
/// `{"error": message}` response.
#[derive(Debug)]
pub struct AppError(pub BurnoutError);

impl From<BurnoutError> for AppError {
    fn from(err: BurnoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
