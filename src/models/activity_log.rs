use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    StageChanged,
    SlotBooked,
    SlotConfirmed,
    SlotCancelled,
    RequestClosed,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::StageChanged => "stage_changed",
            ActivityType::SlotBooked => "slot_booked",
            ActivityType::SlotConfirmed => "slot_confirmed",
            ActivityType::SlotCancelled => "slot_cancelled",
            ActivityType::RequestClosed => "request_closed",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "stage_changed" => Ok(ActivityType::StageChanged),
            "slot_booked" => Ok(ActivityType::SlotBooked),
            "slot_confirmed" => Ok(ActivityType::SlotConfirmed),
            "slot_cancelled" => Ok(ActivityType::SlotCancelled),
            "request_closed" => Ok(ActivityType::RequestClosed),
            other => Err(crate::error::Error::Internal(format!(
                "unknown activity type '{}'",
                other
            ))),
        }
    }
}

/// Who performed a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Candidate(Uuid),
    Manager(Uuid),
    Hr(Uuid),
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Candidate(id) => write!(f, "candidate:{}", id),
            Actor::Manager(id) => write!(f, "manager:{}", id),
            Actor::Hr(id) => write!(f, "hr:{}", id),
            Actor::System => f.write_str("system"),
        }
    }
}

/// Append-only; never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub request_id: Uuid,
    pub stage: Stage,
    pub action_type: ActivityType,
    pub description: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Data for a new entry; id and timestamp are assigned on append.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub candidate_id: Uuid,
    pub request_id: Uuid,
    pub stage: Stage,
    pub action_type: ActivityType,
    pub description: String,
    pub actor: Actor,
}

impl NewActivity {
    pub fn into_entry(self) -> ActivityLogEntry {
        ActivityLogEntry {
            id: Uuid::new_v4(),
            candidate_id: self.candidate_id,
            request_id: self.request_id,
            stage: self.stage,
            action_type: self.action_type,
            description: self.description,
            actor: self.actor.to_string(),
            created_at: Utc::now(),
        }
    }
}
