use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::action::ActionDescriptor;
use crate::models::activity_log::ActivityLogEntry;
use crate::models::recruitment::{InterviewFormat, InterviewSetup, RequestStatus};
use crate::models::slot::{InterviewSlot, SlotStatus};
use crate::models::stage::{Stage, Status};

/// Slot as a candidate may see it: timing and availability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub round_number: i32,
    pub status: SlotStatus,
}

impl From<&InterviewSlot> for SlotView {
    fn from(slot: &InterviewSlot) -> Self {
        Self {
            id: slot.id,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            round_number: slot.round_number,
            status: slot.status,
        }
    }
}

/// Interview configuration as shown to candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub interview_rounds: i32,
    pub interview_format: InterviewFormat,
    pub technical_assessment_required: bool,
}

impl From<&InterviewSetup> for InterviewSummary {
    fn from(setup: &InterviewSetup) -> Self {
        Self {
            interview_rounds: setup.interview_rounds,
            interview_format: setup.interview_format,
            technical_assessment_required: setup.technical_assessment_required,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSlotView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub round_number: i32,
    pub status: SlotStatus,
    pub claimed_by: Option<Uuid>,
    pub claimant_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage: Stage,
    pub stage_index: usize,
    pub stage_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub request_id: Uuid,
    pub title: String,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePass {
    pub candidate_id: Uuid,
    pub name: String,
    /// `None` once the recruitment request has been deleted.
    pub position: Option<PositionSummary>,
    pub progress: StageProgress,
    pub status: Status,
    pub next_action: Option<ActionDescriptor>,
    pub interview: Option<InterviewSummary>,
    pub booked_slot: Option<SlotView>,
    pub available_slots: Vec<SlotView>,
    pub recent_activity: Vec<ActivityLogEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub stage: Stage,
    pub status: Status,
    pub booked_slot: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerPass {
    pub request_id: Uuid,
    pub title: String,
    pub manager_id: Uuid,
    pub request_status: RequestStatus,
    pub progress: StageProgress,
    pub next_action: Option<ActionDescriptor>,
    pub interview: Option<InterviewSetup>,
    pub slots: Vec<ManagerSlotView>,
    pub available_slot_count: usize,
    pub pending_evaluations: usize,
    pub candidates: Vec<CandidateSummary>,
    pub recent_activity: Vec<ActivityLogEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDeletionSummary {
    pub request_id: Uuid,
    pub removed_slots: usize,
    pub affected_candidates: Vec<Uuid>,
}
