//! GET/POST /notifications.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};
use burnout_core::types::Notification;
use burnout_core::{EvaluationService, Principal};
use serde_json::{json, Value};

use crate::error::AppError;

pub async fn list(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(evaluations.notifications(&principal).await?))
}

/// Echo endpoint for client testing. Nothing is stored.
pub async fn echo(body: Option<Json<Value>>) -> (StatusCode, Json<Value>) {
    let data = body.map(|Json(v)| v).unwrap_or(Value::Null);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Notification received.",
            "data": data,
        })),
    )
}
