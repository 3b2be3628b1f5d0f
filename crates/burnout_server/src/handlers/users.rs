//! User administration routes under /users.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    Json,
};
use burnout_core::credentials::{UpdateStatusRequest, UpdateUserRequest};
use burnout_core::types::{User, UserId};
use burnout_core::{CredentialService, Principal};
use serde_json::{json, Value};

use super::{json_body, path_param};
use crate::error::AppError;

pub async fn list(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(credentials.list_users(&principal).await?))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let id = path_param(id)?;
    Ok(Json(credentials.get_user(&principal, id).await?))
}

pub async fn get_by_username(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    Path(username): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        credentials
            .get_user_by_username(&principal, &username)
            .await?,
    ))
}

pub async fn list_by_role(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    Path(role): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(credentials.list_users_by_role(&principal, &role).await?))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    id: Result<Path<UserId>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let user = credentials
        .update_user(&principal, id, json_body(body)?)
        .await?;
    Ok(Json(json!({
        "message": "User updated successfully",
        "user": user,
    })))
}

pub async fn update_status(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    id: Result<Path<UserId>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let user = credentials
        .update_status(&principal, id, json_body(body)?)
        .await?;
    let status = if user.is_active { "activated" } else { "suspended" };
    Ok(Json(json!({
        "message": format!("User {status} successfully."),
        "user": user,
    })))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    Extension(credentials): Extension<Arc<CredentialService>>,
    id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    credentials.delete_user(&principal, id).await?;
    Ok(Json(json!({ "message": "User deleted successfully." })))
}
