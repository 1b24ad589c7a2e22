use serde::{Deserialize, Serialize};

use crate::models::slot::SlotStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Candidate,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CompleteProfile,
    UploadDocuments,
    ConfirmApplication,
    CompleteAssessment,
    SelectSlot,
    ConfirmSlot,
    RespondToOffer,
    SubmitOnboardingDocuments,
    ConfigureInterview,
    AddTimeSlots,
    ReviewCandidates,
}

/// The single next step surfaced to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub action_type: ActionType,
    pub label: String,
    pub description: String,
}

impl ActionDescriptor {
    pub fn new(action_type: ActionType, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type,
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Facts the resolver may consult beyond `(stage, status)`.
///
/// Candidate rules read `own_slot`, `available_slots` and
/// `technical_assessment_required`; manager rules read `has_setup`,
/// `available_slots`, `pending_evaluations` and `request_closed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub own_slot: Option<SlotStatus>,
    pub available_slots: usize,
    pub technical_assessment_required: bool,
    pub has_setup: bool,
    pub pending_evaluations: usize,
    pub request_closed: bool,
}
