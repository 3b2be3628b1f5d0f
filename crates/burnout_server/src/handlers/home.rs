//! Public landing route and role checks.

use axum::{extract::Extension, Json};
use burnout_core::types::Role;
use burnout_core::{AccessGate, Principal};
use serde_json::{json, Value};

use crate::error::AppError;

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Student Burnout Tracker API!" }))
}

pub async fn admin_only(
    Extension(principal): Extension<Principal>,
    Extension(gate): Extension<AccessGate>,
) -> Result<Json<Value>, AppError> {
    gate.require_admin(&principal).await?;
    Ok(Json(json!({ "message": "You are an admin!" })))
}

pub async fn student_only(
    Extension(principal): Extension<Principal>,
    Extension(gate): Extension<AccessGate>,
) -> Result<Json<Value>, AppError> {
    gate.require_role(&principal, &[Role::Student]).await?;
    Ok(Json(json!({ "message": "You are a student!" })))
}
