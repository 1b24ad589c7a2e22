use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::pass_dto::{ActivityQuery, CandidatePass, ManagerPass, RequestDeletionSummary};
use crate::error::Result;
use crate::models::activity_log::ActivityLogEntry;
use crate::models::caller::Caller;
use crate::AppState;

pub async fn get_candidate_pass(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidatePass>> {
    let pass = state.pass_service.candidate_pass(&caller, candidate_id).await?;
    Ok(Json(pass))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(candidate_id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityLogEntry>>> {
    let entries = state
        .pass_service
        .activity(&caller, candidate_id, query.limit)
        .await?;
    Ok(Json(entries))
}

pub async fn get_manager_pass(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ManagerPass>> {
    let pass = state.pass_service.manager_pass(&caller, request_id).await?;
    Ok(Json(pass))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestDeletionSummary>> {
    let summary = state.pass_service.delete_request(&caller, request_id).await?;
    Ok(Json(summary))
}
