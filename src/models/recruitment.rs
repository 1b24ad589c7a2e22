use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stage::{Stage, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Filled,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Filled => "filled",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, RequestStatus::Open)
    }
}

/// One open position. Created by HR/manager CRUD outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentRequest {
    pub id: Uuid,
    pub title: String,
    pub manager_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub request_id: Uuid,
    pub name: String,
    pub stage: Stage,
    pub status: Status,
    pub booked_slot: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewFormat {
    Online,
    InPerson,
    Hybrid,
}

impl InterviewFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewFormat::Online => "online",
            InterviewFormat::InPerson => "in_person",
            InterviewFormat::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSetup {
    pub id: Uuid,
    pub request_id: Uuid,
    pub interview_rounds: i32,
    pub interview_format: InterviewFormat,
    pub technical_assessment_required: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
