use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::interview_dto::{
    BulkCreateSlotsPayload, BulkCreateSlotsResponse, CancelSlotPayload, SlotClaimPayload,
    SlotListQuery,
};
use crate::dto::pass_dto::SlotView;
use crate::error::Result;
use crate::models::caller::Caller;
use crate::models::slot::InterviewSlot;
use crate::AppState;

pub async fn bulk_create_slots(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(setup_id): Path<Uuid>,
    Json(payload): Json<BulkCreateSlotsPayload>,
) -> Result<(StatusCode, Json<BulkCreateSlotsResponse>)> {
    let slots = state
        .slot_service
        .bulk_create(&caller, setup_id, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateSlotsResponse {
            created: slots.len(),
            slot_ids: slots.iter().map(|s| s.id).collect(),
            slots,
        }),
    ))
}

pub async fn list_available_slots(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(setup_id): Path<Uuid>,
    Query(query): Query<SlotListQuery>,
) -> Result<Json<Vec<SlotView>>> {
    let slots = state
        .slot_service
        .list_available(&caller, setup_id, query.round)
        .await?;
    Ok(Json(slots))
}

pub async fn book_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<SlotClaimPayload>,
) -> Result<Json<InterviewSlot>> {
    let slot = state
        .slot_service
        .book(&caller, slot_id, payload.candidate_id)
        .await?;
    Ok(Json(slot))
}

pub async fn confirm_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<SlotClaimPayload>,
) -> Result<Json<InterviewSlot>> {
    let slot = state
        .slot_service
        .confirm(&caller, slot_id, payload.candidate_id)
        .await?;
    Ok(Json(slot))
}

pub async fn cancel_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slot_id): Path<Uuid>,
    payload: Option<Json<CancelSlotPayload>>,
) -> Result<Json<InterviewSlot>> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;
    let slot = state
        .slot_service
        .cancel(&caller, slot_id, payload.reason)
        .await?;
    Ok(Json(slot))
}
