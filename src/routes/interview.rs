use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::interview_dto::{CreateInterviewSetupPayload, UpdateInterviewSetupPayload};
use crate::error::Result;
use crate::models::caller::Caller;
use crate::models::recruitment::InterviewSetup;
use crate::AppState;

pub async fn create_interview_setup(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<CreateInterviewSetupPayload>,
) -> Result<(StatusCode, Json<InterviewSetup>)> {
    let setup = state
        .interview_service
        .create_setup(&caller, request_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(setup)))
}

pub async fn update_interview_setup(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(setup_id): Path<Uuid>,
    Json(payload): Json<UpdateInterviewSetupPayload>,
) -> Result<Json<InterviewSetup>> {
    let setup = state
        .interview_service
        .update_setup(&caller, setup_id, payload)
        .await?;
    Ok(Json(setup))
}
