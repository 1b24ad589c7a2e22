//! Recruitment pipeline stages and the status vocabulary each stage admits.
//!
//! Both pass views (candidate and manager) read the same ordered stage list.
//! A `(stage, status)` pair is valid only if the status appears in that
//! stage's row of [`STAGE_TABLE`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Application,
    Screening,
    Interview,
    Offer,
    Onboarding,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    // application
    ProfileIncomplete,
    DocumentsPending,
    ConfirmationPending,
    Submitted,
    UnderReview,
    // screening
    ScreeningPending,
    AssessmentPending,
    AssessmentSubmitted,
    Shortlisted,
    // interview
    SlotSelectionPending,
    SlotBooked,
    SlotConfirmed,
    InterviewCompleted,
    EvaluationPending,
    // offer
    OfferPending,
    OfferExtended,
    OfferAccepted,
    OfferDeclined,
    // onboarding
    OnboardingInProgress,
    OnboardingComplete,
    // shared terminal outcomes
    Rejected,
    Withdrawn,
    Hired,
}

/// Ordered stage rows. Index in this slice is the stage's progress index.
pub const STAGE_TABLE: &[(Stage, &[Status])] = &[
    (
        Stage::Application,
        &[
            Status::ProfileIncomplete,
            Status::DocumentsPending,
            Status::ConfirmationPending,
            Status::Submitted,
            Status::UnderReview,
        ],
    ),
    (
        Stage::Screening,
        &[
            Status::ScreeningPending,
            Status::AssessmentPending,
            Status::AssessmentSubmitted,
            Status::Shortlisted,
            Status::Rejected,
        ],
    ),
    (
        Stage::Interview,
        &[
            Status::SlotSelectionPending,
            Status::SlotBooked,
            Status::SlotConfirmed,
            Status::InterviewCompleted,
            Status::EvaluationPending,
            Status::Rejected,
        ],
    ),
    (
        Stage::Offer,
        &[
            Status::OfferPending,
            Status::OfferExtended,
            Status::OfferAccepted,
            Status::OfferDeclined,
        ],
    ),
    (
        Stage::Onboarding,
        &[
            Status::DocumentsPending,
            Status::OnboardingInProgress,
            Status::OnboardingComplete,
        ],
    ),
    (
        Stage::Closed,
        &[Status::Hired, Status::Rejected, Status::Withdrawn],
    ),
];

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Application,
        Stage::Screening,
        Stage::Interview,
        Stage::Offer,
        Stage::Onboarding,
        Stage::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Application => "application",
            Stage::Screening => "screening",
            Stage::Interview => "interview",
            Stage::Offer => "offer",
            Stage::Onboarding => "onboarding",
            Stage::Closed => "closed",
        }
    }

    pub fn index(&self) -> usize {
        STAGE_TABLE
            .iter()
            .position(|(stage, _)| stage == self)
            .unwrap_or(0)
    }

    pub fn statuses(&self) -> &'static [Status] {
        STAGE_TABLE
            .iter()
            .find(|(stage, _)| stage == self)
            .map(|(_, statuses)| *statuses)
            .unwrap_or(&[])
    }

    pub fn admits(&self, status: Status) -> bool {
        self.statuses().contains(&status)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Closed)
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ProfileIncomplete => "profile_incomplete",
            Status::DocumentsPending => "documents_pending",
            Status::ConfirmationPending => "confirmation_pending",
            Status::Submitted => "submitted",
            Status::UnderReview => "under_review",
            Status::ScreeningPending => "screening_pending",
            Status::AssessmentPending => "assessment_pending",
            Status::AssessmentSubmitted => "assessment_submitted",
            Status::Shortlisted => "shortlisted",
            Status::SlotSelectionPending => "slot_selection_pending",
            Status::SlotBooked => "slot_booked",
            Status::SlotConfirmed => "slot_confirmed",
            Status::InterviewCompleted => "interview_completed",
            Status::EvaluationPending => "evaluation_pending",
            Status::OfferPending => "offer_pending",
            Status::OfferExtended => "offer_extended",
            Status::OfferAccepted => "offer_accepted",
            Status::OfferDeclined => "offer_declined",
            Status::OnboardingInProgress => "onboarding_in_progress",
            Status::OnboardingComplete => "onboarding_complete",
            Status::Rejected => "rejected",
            Status::Withdrawn => "withdrawn",
            Status::Hired => "hired",
        }
    }

    const ALL: [Status; 23] = [
        Status::ProfileIncomplete,
        Status::DocumentsPending,
        Status::ConfirmationPending,
        Status::Submitted,
        Status::UnderReview,
        Status::ScreeningPending,
        Status::AssessmentPending,
        Status::AssessmentSubmitted,
        Status::Shortlisted,
        Status::SlotSelectionPending,
        Status::SlotBooked,
        Status::SlotConfirmed,
        Status::InterviewCompleted,
        Status::EvaluationPending,
        Status::OfferPending,
        Status::OfferExtended,
        Status::OfferAccepted,
        Status::OfferDeclined,
        Status::OnboardingInProgress,
        Status::OnboardingComplete,
        Status::Rejected,
        Status::Withdrawn,
        Status::Hired,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown stage: {}", s)))
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown status: {}", s)))
    }
}

/// Number of stages shown on the progress bar.
pub fn stage_count() -> usize {
    STAGE_TABLE.len()
}

/// Progress index for a raw stage name. Unknown names resolve to 0 and are
/// reported as a data-quality event.
pub fn stage_index(name: &str) -> usize {
    match name.parse::<Stage>() {
        Ok(stage) => stage.index(),
        Err(_) => {
            tracing::warn!(stage = %name, "unknown stage name, rendering at index 0");
            0
        }
    }
}

/// Rejects pairs that are not in the stage's vocabulary.
pub fn validate_pair(stage: Stage, status: Status) -> Result<()> {
    if stage.admits(status) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Status '{}' is not valid for stage '{}'",
            status, stage
        )))
    }
}
