use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::recruitment::InterviewFormat;
use crate::models::slot::InterviewSlot;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInterviewSetupPayload {
    #[validate(range(min = 1, max = 10, message = "interview_rounds must be between 1 and 10"))]
    pub interview_rounds: i32,
    pub interview_format: InterviewFormat,
    #[serde(default)]
    pub technical_assessment_required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateInterviewSetupPayload {
    #[validate(range(min = 1, max = 10, message = "interview_rounds must be between 1 and 10"))]
    pub interview_rounds: Option<i32>,
    pub interview_format: Option<InterviewFormat>,
    pub technical_assessment_required: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkCreateSlotsPayload {
    #[validate(length(min = 1, message = "at least one date is required"))]
    pub dates: Vec<NaiveDate>,
    #[validate(length(min = 1, message = "at least one time range is required"))]
    pub time_ranges: Vec<TimeRange>,
    #[validate(range(min = 1, message = "round_number must be positive"))]
    pub round_number: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkCreateSlotsResponse {
    pub created: usize,
    pub slot_ids: Vec<Uuid>,
    pub slots: Vec<InterviewSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotListQuery {
    pub round: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotClaimPayload {
    pub candidate_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelSlotPayload {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}
