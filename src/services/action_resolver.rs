//! Next-action resolution for both pass views.
//!
//! Pure functions only. Each actor has an ordered rule list and the first
//! rule whose guard holds wins, so at most one action is ever produced.
//! `Ok(None)` means nothing is required right now.

use crate::error::Result;
use crate::models::action::{ActionContext, ActionDescriptor, ActionType, ActorRole};
use crate::models::slot::SlotStatus;
use crate::models::stage::{validate_pair, Stage, Status};

struct CandidateRule {
    stage: Stage,
    status: Status,
    guard: fn(&ActionContext) -> bool,
    action: ActionType,
    label: &'static str,
    description: &'static str,
}

fn always(_: &ActionContext) -> bool {
    true
}

fn assessment_required(ctx: &ActionContext) -> bool {
    ctx.technical_assessment_required
}

fn holds_unconfirmed_slot(ctx: &ActionContext) -> bool {
    ctx.own_slot == Some(SlotStatus::Booked)
}

fn can_pick_slot(ctx: &ActionContext) -> bool {
    ctx.own_slot.is_none() && ctx.available_slots > 0
}

const CANDIDATE_RULES: &[CandidateRule] = &[
    CandidateRule {
        stage: Stage::Application,
        status: Status::ProfileIncomplete,
        guard: always,
        action: ActionType::CompleteProfile,
        label: "Complete Profile",
        description: "Fill in the missing profile details to continue your application.",
    },
    CandidateRule {
        stage: Stage::Application,
        status: Status::DocumentsPending,
        guard: always,
        action: ActionType::UploadDocuments,
        label: "Upload Documents",
        description: "Upload the documents requested for this position.",
    },
    CandidateRule {
        stage: Stage::Application,
        status: Status::ConfirmationPending,
        guard: always,
        action: ActionType::ConfirmApplication,
        label: "Confirm Application",
        description: "Review your application and confirm it for submission.",
    },
    CandidateRule {
        stage: Stage::Screening,
        status: Status::AssessmentPending,
        guard: assessment_required,
        action: ActionType::CompleteAssessment,
        label: "Complete Technical Assessment",
        description: "Complete the technical assessment required for this role.",
    },
    CandidateRule {
        stage: Stage::Interview,
        status: Status::SlotSelectionPending,
        guard: holds_unconfirmed_slot,
        action: ActionType::ConfirmSlot,
        label: "Confirm Interview Slot",
        description: "Confirm the interview slot you booked.",
    },
    CandidateRule {
        stage: Stage::Interview,
        status: Status::SlotSelectionPending,
        guard: can_pick_slot,
        action: ActionType::SelectSlot,
        label: "Select Interview Slot",
        description: "Choose one of the available interview time slots.",
    },
    CandidateRule {
        stage: Stage::Interview,
        status: Status::SlotBooked,
        guard: holds_unconfirmed_slot,
        action: ActionType::ConfirmSlot,
        label: "Confirm Interview Slot",
        description: "Confirm the interview slot you booked.",
    },
    CandidateRule {
        stage: Stage::Interview,
        status: Status::SlotBooked,
        guard: can_pick_slot,
        action: ActionType::SelectSlot,
        label: "Select Interview Slot",
        description: "Your previous slot was cancelled. Choose another available slot.",
    },
    CandidateRule {
        stage: Stage::Offer,
        status: Status::OfferExtended,
        guard: always,
        action: ActionType::RespondToOffer,
        label: "Respond to Offer",
        description: "Accept or decline the offer extended to you.",
    },
    CandidateRule {
        stage: Stage::Onboarding,
        status: Status::DocumentsPending,
        guard: always,
        action: ActionType::SubmitOnboardingDocuments,
        label: "Submit Onboarding Documents",
        description: "Submit the documents needed to complete onboarding.",
    },
];

struct ManagerRule {
    guard: fn(&ActionContext) -> bool,
    build: fn(&ActionContext) -> ActionDescriptor,
}

const MANAGER_RULES: &[ManagerRule] = &[
    ManagerRule {
        guard: |ctx| !ctx.has_setup,
        build: |_| {
            ActionDescriptor::new(
                ActionType::ConfigureInterview,
                "Configure Interview",
                "Set the interview rounds, format and assessment requirement.",
            )
        },
    },
    ManagerRule {
        guard: |ctx| ctx.available_slots == 0,
        build: |_| {
            ActionDescriptor::new(
                ActionType::AddTimeSlots,
                "Add Time Slots",
                "Publish interview time slots so candidates can book.",
            )
        },
    },
    ManagerRule {
        guard: |ctx| ctx.pending_evaluations > 0,
        build: |ctx| {
            ActionDescriptor::new(
                ActionType::ReviewCandidates,
                format!("Review {} Candidate(s)", ctx.pending_evaluations),
                "Candidates are waiting for your interview evaluation.",
            )
        },
    },
];

pub fn resolve(
    role: ActorRole,
    stage: Stage,
    status: Status,
    ctx: &ActionContext,
) -> Result<Option<ActionDescriptor>> {
    validate_pair(stage, status)?;
    Ok(match role {
        ActorRole::Candidate => resolve_candidate(stage, status, ctx),
        ActorRole::Manager if stage.is_terminal() => None,
        ActorRole::Manager => resolve_manager(ctx),
    })
}

pub fn resolve_candidate(stage: Stage, status: Status, ctx: &ActionContext) -> Option<ActionDescriptor> {
    CANDIDATE_RULES
        .iter()
        .find(|rule| rule.stage == stage && rule.status == status && (rule.guard)(ctx))
        .map(|rule| ActionDescriptor::new(rule.action, rule.label, rule.description))
}

pub fn resolve_manager(ctx: &ActionContext) -> Option<ActionDescriptor> {
    if ctx.request_closed {
        return None;
    }
    MANAGER_RULES
        .iter()
        .find(|rule| (rule.guard)(ctx))
        .map(|rule| (rule.build)(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::stage::STAGE_TABLE;

    fn candidate(stage: Stage, status: Status, ctx: &ActionContext) -> Option<ActionType> {
        resolve(ActorRole::Candidate, stage, status, ctx)
            .unwrap()
            .map(|a| a.action_type)
    }

    #[test]
    fn slot_selection_surfaces_select_interview_slot() {
        let ctx = ActionContext {
            available_slots: 3,
            ..Default::default()
        };
        let action = resolve(
            ActorRole::Candidate,
            Stage::Interview,
            Status::SlotSelectionPending,
            &ctx,
        )
        .unwrap()
        .unwrap();
        assert_eq!(action.action_type, ActionType::SelectSlot);
        assert_eq!(action.label, "Select Interview Slot");
    }

    #[test]
    fn booked_slot_takes_precedence_over_selection() {
        let ctx = ActionContext {
            own_slot: Some(SlotStatus::Booked),
            available_slots: 5,
            ..Default::default()
        };
        assert_eq!(
            candidate(Stage::Interview, Status::SlotSelectionPending, &ctx),
            Some(ActionType::ConfirmSlot)
        );
        assert_eq!(
            candidate(Stage::Interview, Status::SlotBooked, &ctx),
            Some(ActionType::ConfirmSlot)
        );
    }

    #[test]
    fn nothing_to_do_is_none_not_error() {
        let ctx = ActionContext::default();
        assert_eq!(candidate(Stage::Interview, Status::SlotSelectionPending, &ctx), None);
        let confirmed = ActionContext {
            own_slot: Some(SlotStatus::Confirmed),
            ..Default::default()
        };
        assert_eq!(candidate(Stage::Interview, Status::SlotConfirmed, &confirmed), None);
        assert_eq!(candidate(Stage::Closed, Status::Hired, &ctx), None);
    }

    #[test]
    fn assessment_action_depends_on_setup_flag() {
        let mut ctx = ActionContext::default();
        assert_eq!(candidate(Stage::Screening, Status::AssessmentPending, &ctx), None);
        ctx.technical_assessment_required = true;
        assert_eq!(
            candidate(Stage::Screening, Status::AssessmentPending, &ctx),
            Some(ActionType::CompleteAssessment)
        );
    }

    #[test]
    fn invalid_pair_is_an_error() {
        let err = resolve(
            ActorRole::Candidate,
            Stage::Application,
            Status::OfferExtended,
            &ActionContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn manager_guards_apply_in_order() {
        let mut ctx = ActionContext {
            has_setup: false,
            available_slots: 0,
            pending_evaluations: 2,
            ..Default::default()
        };
        assert_eq!(
            resolve_manager(&ctx).map(|a| a.action_type),
            Some(ActionType::ConfigureInterview)
        );

        ctx.has_setup = true;
        assert_eq!(
            resolve_manager(&ctx).map(|a| a.action_type),
            Some(ActionType::AddTimeSlots)
        );

        ctx.available_slots = 4;
        let review = resolve_manager(&ctx).unwrap();
        assert_eq!(review.action_type, ActionType::ReviewCandidates);
        assert_eq!(review.label, "Review 2 Candidate(s)");

        ctx.pending_evaluations = 0;
        assert_eq!(resolve_manager(&ctx), None);

        ctx.request_closed = true;
        ctx.has_setup = false;
        assert_eq!(resolve_manager(&ctx), None);
    }

    #[test]
    fn manager_gets_nothing_on_closed_stage() {
        let ctx = ActionContext::default();
        let action = resolve(ActorRole::Manager, Stage::Closed, Status::Hired, &ctx).unwrap();
        assert_eq!(action, None);
        let action = resolve(ActorRole::Manager, Stage::Interview, Status::SlotBooked, &ctx).unwrap();
        assert_eq!(action.map(|a| a.action_type), Some(ActionType::ConfigureInterview));
    }

    #[test]
    fn every_rule_targets_a_valid_pair() {
        for rule in CANDIDATE_RULES {
            assert!(
                rule.stage.admits(rule.status),
                "{}/{} is not in the stage table",
                rule.stage,
                rule.status
            );
        }
    }

    #[test]
    fn resolution_is_deterministic_over_all_pairs() {
        let contexts = [
            ActionContext::default(),
            ActionContext {
                own_slot: Some(SlotStatus::Booked),
                available_slots: 2,
                technical_assessment_required: true,
                ..Default::default()
            },
            ActionContext {
                available_slots: 1,
                ..Default::default()
            },
        ];
        for (stage, statuses) in STAGE_TABLE {
            for status in statuses.iter() {
                for ctx in &contexts {
                    let first = resolve(ActorRole::Candidate, *stage, *status, ctx).unwrap();
                    let second = resolve(ActorRole::Candidate, *stage, *status, ctx).unwrap();
                    assert_eq!(first, second);
                }
            }
        }
    }
}
