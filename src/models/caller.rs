use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::activity_log::Actor;
use crate::models::recruitment::RecruitmentRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Candidate,
    Manager,
    Hr,
    Admin,
}

impl std::str::FromStr for CallerRole {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "candidate" => Ok(CallerRole::Candidate),
            "manager" => Ok(CallerRole::Manager),
            "hr" => Ok(CallerRole::Hr),
            "admin" => Ok(CallerRole::Admin),
            _ => Err(()),
        }
    }
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: CallerRole,
}

impl Caller {
    pub fn candidate(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Candidate,
        }
    }

    pub fn manager(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Manager,
        }
    }

    pub fn hr(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Hr,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, CallerRole::Hr | CallerRole::Admin)
    }

    pub fn is_candidate(&self, candidate_id: Uuid) -> bool {
        self.role == CallerRole::Candidate && self.id == candidate_id
    }

    /// HR/admin, or the hiring manager named on the request.
    pub fn manages(&self, request: &RecruitmentRequest) -> bool {
        self.is_staff() || (self.role == CallerRole::Manager && self.id == request.manager_id)
    }

    pub fn as_actor(&self) -> Actor {
        match self.role {
            CallerRole::Candidate => Actor::Candidate(self.id),
            CallerRole::Manager => Actor::Manager(self.id),
            CallerRole::Hr | CallerRole::Admin => Actor::Hr(self.id),
        }
    }
}
