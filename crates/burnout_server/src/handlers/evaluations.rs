//! Evaluation routes: submission, listings, meetings and handling.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    Json,
};
use burnout_core::evaluations::{ScheduleMeetingRequest, SubmitEvaluationRequest};
use burnout_core::types::{
    EvaluationId, EvaluationView, HandleOutcome, NumberedEvaluation, StudentMeetingInfo, UserId,
};
use burnout_core::{EvaluationService, Principal};
use serde_json::{json, Value};

use super::{json_body, path_param};
use crate::error::AppError;

pub async fn submit(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    body: Result<Json<SubmitEvaluationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let evaluation = evaluations
        .submit(&principal, json_body(body)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Evaluation submitted successfully.",
            "evaluation": evaluation,
        })),
    ))
}

pub async fn list_all(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
) -> Result<Json<Vec<EvaluationView>>, AppError> {
    Ok(Json(evaluations.list_all(&principal).await?))
}

pub async fn list_mine(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
) -> Result<Json<Vec<EvaluationView>>, AppError> {
    Ok(Json(evaluations.list_mine(&principal).await?))
}

pub async fn list_for_user(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Vec<NumberedEvaluation>>, AppError> {
    let user_id = path_param(user_id)?;
    Ok(Json(evaluations.list_for_user(&principal, user_id).await?))
}

pub async fn list_for_username(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<EvaluationView>>, AppError> {
    Ok(Json(
        evaluations
            .list_for_username(&principal, &username)
            .await?,
    ))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    id: Result<Path<EvaluationId>, PathRejection>,
) -> Result<Json<EvaluationView>, AppError> {
    let id = path_param(id)?;
    Ok(Json(evaluations.get(&principal, id).await?))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    id: Result<Path<EvaluationId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    evaluations.delete(&principal, id).await?;
    Ok(Json(json!({ "message": "Evaluation deleted successfully." })))
}

pub async fn schedule_meeting(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    id: Result<Path<EvaluationId>, PathRejection>,
    body: Result<Json<ScheduleMeetingRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let evaluation = evaluations
        .schedule_meeting(&principal, id, json_body(body)?)
        .await?;
    Ok(Json(json!({
        "message": "Meeting scheduled successfully.",
        "evaluation": evaluation,
    })))
}

pub async fn mark_handled(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
    id: Result<Path<EvaluationId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let message = match evaluations.mark_handled(&principal, id).await? {
        HandleOutcome::Handled(_) => "Evaluation marked as handled.",
        HandleOutcome::AlreadyHandled(_) => "Evaluation already handled.",
    };
    Ok(Json(json!({ "message": message })))
}

/// GET /evaluations/student/meeting
pub async fn student_meeting(
    Extension(principal): Extension<Principal>,
    Extension(evaluations): Extension<Arc<EvaluationService>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let response = match evaluations.student_meeting_info(&principal).await? {
        StudentMeetingInfo::NoHandledEvaluation => (
            StatusCode::NOT_FOUND,
            json!({ "message": "No handled evaluation found." }),
        ),
        StudentMeetingInfo::NotYetScheduled { .. } => (
            StatusCode::OK,
            json!({ "message": "No meeting has been scheduled yet." }),
        ),
        StudentMeetingInfo::Scheduled(details) => {
            (StatusCode::OK, json!({ "meeting": details }))
        }
    };
    Ok((response.0, Json(response.1)))
}
