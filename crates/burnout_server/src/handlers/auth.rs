//! POST /signup, /login (public) and /logout (authenticated).

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use burnout_core::credentials::{LoginRequest, SignupRequest};
use burnout_core::{CredentialService, Principal};
use serde_json::{json, Value};

use super::json_body;
use crate::error::AppError;

pub async fn signup(
    Extension(credentials): Extension<Arc<CredentialService>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = credentials.signup(json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully.",
            "user": user,
        })),
    ))
}

pub async fn login(
    Extension(credentials): Extension<Arc<CredentialService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let outcome = credentials.login(json_body(body)?).await?;
    Ok(Json(json!({
        "message": "Login successful.",
        "access_token": outcome.token.token,
        "user": outcome.user,
    })))
}

pub async fn logout(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
) -> Result<Json<Value>, AppError> {
    credentials.logout(&principal).await?;
    Ok(Json(json!({ "message": "Successfully logged out" })))
}
