use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Confirmed,
    Cancelled,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Confirmed => "confirmed",
            SlotStatus::Cancelled => "cancelled",
        }
    }

    /// Booked or confirmed: the slot carries a live claim.
    pub fn is_claimed(&self) -> bool {
        matches!(self, SlotStatus::Booked | SlotStatus::Confirmed)
    }
}

impl std::str::FromStr for SlotStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "booked" => Ok(SlotStatus::Booked),
            "confirmed" => Ok(SlotStatus::Confirmed),
            "cancelled" => Ok(SlotStatus::Cancelled),
            other => Err(crate::error::Error::InvariantViolation(format!(
                "unknown slot status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub id: Uuid,
    pub setup_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub round_number: i32,
    pub status: SlotStatus,
    pub claimed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewSlot {
    pub fn available(
        setup_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        round_number: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            setup_id,
            date,
            start_time,
            end_time,
            round_number,
            status: SlotStatus::Available,
            claimed_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the status/claimant pairing every stored slot must satisfy.
    pub fn check_claim_consistency(&self) -> crate::error::Result<()> {
        let consistent = match self.status {
            SlotStatus::Booked | SlotStatus::Confirmed => self.claimed_by.is_some(),
            SlotStatus::Available | SlotStatus::Cancelled => self.claimed_by.is_none(),
        };
        if consistent {
            Ok(())
        } else {
            tracing::error!(
                slot_id = %self.id,
                status = self.status.as_str(),
                claimed_by = ?self.claimed_by,
                "slot claim state is inconsistent"
            );
            Err(crate::error::Error::InvariantViolation(format!(
                "slot {} is {} with claimant {:?}",
                self.id,
                self.status.as_str(),
                self.claimed_by
            )))
        }
    }
}

/// Outcome of the atomic `available -> booked` transition.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed(InterviewSlot),
    /// The slot was not available when the check-and-set ran.
    Conflict,
    /// The candidate already holds a live claim in this setup round.
    AlreadyHoldsRound { slot_id: Uuid, round_number: i32 },
    NotFound,
}

/// Outcome of the atomic `booked -> confirmed` transition.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Confirmed(InterviewSlot),
    AlreadyConfirmed(InterviewSlot),
    NotClaimant,
    Cancelled,
    Inconsistent(InterviewSlot),
    NotFound,
}

/// Outcome of the atomic cancellation.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled {
        slot: InterviewSlot,
        released: Option<Uuid>,
    },
    AlreadyCancelled(InterviewSlot),
    NotFound,
}
