use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::candidate_dto::TransitionCandidatePayload;
use crate::error::Result;
use crate::models::caller::Caller;
use crate::models::recruitment::Candidate;
use crate::AppState;

pub async fn transition_candidate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(candidate_id): Path<Uuid>,
    Json(payload): Json<TransitionCandidatePayload>,
) -> Result<Json<Candidate>> {
    payload.validate()?;
    let (stage, status) = payload.pair()?;
    let candidate = state
        .candidate_service
        .transition(&caller, candidate_id, stage, status, payload.note)
        .await?;
    Ok(Json(candidate))
}
