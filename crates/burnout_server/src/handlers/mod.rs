//! Route handlers, one module per resource.

pub mod auth;
pub mod evaluations;
pub mod home;
pub mod notifications;
pub mod users;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use burnout_core::BurnoutError;

use crate::error::AppError;

/// Unwrap a JSON body. A request without a JSON body counts as an empty
/// request so the services report missing fields with their usual
/// validation errors; a body that is present but malformed is rejected.
pub(crate) fn json_body<T: Default>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    match body {
        Ok(Json(inner)) => Ok(inner),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            Err(BurnoutError::InvalidInput(rejection.body_text()).into())
        }
    }
}

/// Unwrap a path parameter, reporting a malformed segment in the usual
/// `{"error": ...}` envelope.
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    path.map(|Path(inner)| inner)
        .map_err(|rejection| BurnoutError::InvalidInput(rejection.body_text()).into())
}
