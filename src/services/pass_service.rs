//! Read-side assembly of candidate and manager passes.
//!
//! Nothing here writes inventory. `delete_request` lives alongside because
//! the teardown is driven from the manager pass and only appends activity.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::database::store::PassStore;
use crate::dto::pass_dto::{
    CandidatePass, CandidateSummary, InterviewSummary, ManagerPass, ManagerSlotView, PositionSummary,
    RequestDeletionSummary, SlotView, StageProgress,
};
use crate::error::{Error, Result};
use crate::models::action::{ActionContext, ActorRole};
use crate::models::activity_log::{ActivityLogEntry, ActivityType, NewActivity};
use crate::models::caller::Caller;
use crate::models::recruitment::{Candidate, RecruitmentRequest};
use crate::models::slot::SlotStatus;
use crate::models::stage::{stage_count, Stage, Status};
use crate::services::action_resolver;
use crate::services::activity_service::ActivityService;

/// Upper bound for an explicit `limit` on activity reads.
const MAX_ACTIVITY_LIMIT: usize = 100;

fn progress(stage: Stage) -> StageProgress {
    StageProgress {
        stage,
        stage_index: stage.index(),
        stage_count: stage_count(),
    }
}

fn awaiting_evaluation(candidate: &Candidate) -> bool {
    candidate.stage == Stage::Interview && candidate.status == Status::EvaluationPending
}

#[derive(Clone)]
pub struct PassService {
    store: Arc<dyn PassStore>,
    activity: ActivityService,
    activity_limit: usize,
}

impl PassService {
    pub fn new(store: Arc<dyn PassStore>, activity: ActivityService, activity_limit: usize) -> Self {
        Self {
            store,
            activity,
            activity_limit,
        }
    }

    async fn load_candidate(&self, caller: &Caller, candidate_id: Uuid) -> Result<(Candidate, Option<RecruitmentRequest>)> {
        let candidate = self
            .store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;
        let request = self.store.get_request(candidate.request_id).await?;

        let allowed = caller.is_candidate(candidate_id)
            || caller.is_staff()
            || request.as_ref().is_some_and(|r| caller.manages(r));
        if !allowed {
            return Err(Error::Forbidden("Not allowed to view this candidate".into()));
        }
        Ok((candidate, request))
    }

    pub async fn candidate_pass(&self, caller: &Caller, candidate_id: Uuid) -> Result<CandidatePass> {
        let (candidate, request) = self.load_candidate(caller, candidate_id).await?;

        let setup = match &request {
            Some(r) => self.store.get_setup_for_request(r.id).await?,
            None => None,
        };
        let slots = match &setup {
            Some(s) => self.store.list_slots(s.id).await?,
            None => Vec::new(),
        };

        let booked_slot = candidate
            .booked_slot
            .and_then(|id| slots.iter().find(|s| s.id == id))
            .filter(|s| s.claimed_by == Some(candidate.id));
        if let Some(slot) = booked_slot {
            slot.check_claim_consistency()?;
        }
        let available_slots: Vec<SlotView> = slots
            .iter()
            .filter(|s| s.status == SlotStatus::Available)
            .map(SlotView::from)
            .collect();

        let ctx = ActionContext {
            own_slot: booked_slot.map(|s| s.status),
            available_slots: available_slots.len(),
            technical_assessment_required: setup
                .as_ref()
                .is_some_and(|s| s.technical_assessment_required),
            has_setup: setup.is_some(),
            pending_evaluations: 0,
            request_closed: request.as_ref().map_or(true, |r| r.status.is_closed()),
        };
        let next_action = action_resolver::resolve(
            ActorRole::Candidate,
            candidate.stage,
            candidate.status,
            &ctx,
        )?;

        let recent_activity = self
            .activity
            .recent_for_candidate(candidate.id, self.activity_limit)
            .await?;

        Ok(CandidatePass {
            candidate_id: candidate.id,
            name: candidate.name,
            position: request.map(|r| PositionSummary {
                request_id: r.id,
                title: r.title,
                status: r.status,
            }),
            progress: progress(candidate.stage),
            status: candidate.status,
            next_action,
            interview: setup.as_ref().map(InterviewSummary::from),
            booked_slot: booked_slot.map(SlotView::from),
            available_slots,
            recent_activity,
            generated_at: Utc::now(),
        })
    }

    pub async fn manager_pass(&self, caller: &Caller, request_id: Uuid) -> Result<ManagerPass> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| Error::NotFound("Recruitment request not found".into()))?;
        if !caller.manages(&request) {
            return Err(Error::Forbidden(
                "Only the hiring manager can view this request".into(),
            ));
        }

        let setup = self.store.get_setup_for_request(request_id).await?;
        let slots = match &setup {
            Some(s) => self.store.list_slots(s.id).await?,
            None => Vec::new(),
        };
        let candidates = self.store.list_candidates(request_id).await?;
        let names: HashMap<Uuid, &str> = candidates.iter().map(|c| (c.id, c.name.as_str())).collect();

        let mut slot_views = Vec::new();
        for slot in slots.iter().filter(|s| s.status != SlotStatus::Cancelled) {
            slot.check_claim_consistency()?;
            slot_views.push(ManagerSlotView {
                id: slot.id,
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                round_number: slot.round_number,
                status: slot.status,
                claimed_by: slot.claimed_by,
                claimant_name: slot
                    .claimed_by
                    .and_then(|id| names.get(&id))
                    .map(|n| n.to_string()),
            });
        }
        let available_slot_count = slots
            .iter()
            .filter(|s| s.status == SlotStatus::Available)
            .count();
        let pending_evaluations = candidates.iter().filter(|c| awaiting_evaluation(c)).count();

        let stage = if request.status.is_closed() {
            Stage::Closed
        } else {
            candidates
                .iter()
                .map(|c| c.stage)
                .filter(|s| !s.is_terminal())
                .max()
                .unwrap_or(Stage::Application)
        };

        let ctx = ActionContext {
            has_setup: setup.is_some(),
            available_slots: available_slot_count,
            pending_evaluations,
            request_closed: request.status.is_closed(),
            ..Default::default()
        };
        let next_action = action_resolver::resolve_manager(&ctx);

        let recent_activity = self
            .activity
            .recent_for_request(request_id, self.activity_limit)
            .await?;

        Ok(ManagerPass {
            request_id: request.id,
            title: request.title,
            manager_id: request.manager_id,
            request_status: request.status,
            progress: progress(stage),
            next_action,
            interview: setup,
            slots: slot_views,
            available_slot_count,
            pending_evaluations,
            candidates: candidates
                .into_iter()
                .map(|c| CandidateSummary {
                    id: c.id,
                    name: c.name,
                    stage: c.stage,
                    status: c.status,
                    booked_slot: c.booked_slot,
                })
                .collect(),
            recent_activity,
            generated_at: Utc::now(),
        })
    }

    pub async fn activity(
        &self,
        caller: &Caller,
        candidate_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityLogEntry>> {
        self.load_candidate(caller, candidate_id).await?;
        let limit = limit
            .unwrap_or(self.activity_limit)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        self.activity.recent_for_candidate(candidate_id, limit).await
    }

    /// Removes the request's setup and slots. Candidate rows and their
    /// activity survive; each candidate gets a `request_closed` entry.
    pub async fn delete_request(&self, caller: &Caller, request_id: Uuid) -> Result<RequestDeletionSummary> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| Error::NotFound("Recruitment request not found".into()))?;
        if !caller.manages(&request) {
            return Err(Error::Forbidden(
                "Only HR or the hiring manager can delete this request".into(),
            ));
        }

        let teardown = self.store.delete_request(request_id).await?;
        if teardown.request.is_none() {
            return Err(Error::NotFound("Recruitment request not found".into()));
        }

        let mut affected = Vec::with_capacity(teardown.candidates.len());
        for candidate in &teardown.candidates {
            self.activity
                .record(NewActivity {
                    candidate_id: candidate.id,
                    request_id,
                    stage: candidate.stage,
                    action_type: ActivityType::RequestClosed,
                    description: format!("Recruitment request '{}' was closed", request.title),
                    actor: caller.as_actor(),
                })
                .await?;
            affected.push(candidate.id);
        }

        tracing::info!(
            request_id = %request_id,
            removed_slots = teardown.removed_slots,
            candidates = affected.len(),
            "recruitment request deleted"
        );
        Ok(RequestDeletionSummary {
            request_id,
            removed_slots: teardown.removed_slots,
            affected_candidates: affected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::interview_dto::{BulkCreateSlotsPayload, CreateInterviewSetupPayload, TimeRange};
    use crate::database::memory::InMemoryStore;
    use crate::models::action::ActionType;
    use crate::models::recruitment::{InterviewFormat, RequestStatus};
    use crate::services::candidate_service::CandidateService;
    use crate::services::interview_service::InterviewService;
    use crate::services::slot_service::SlotBookingService;
    use chrono::{NaiveDate, NaiveTime};

    struct World {
        store: Arc<InMemoryStore>,
        passes: PassService,
        interviews: InterviewService,
        slots: SlotBookingService,
        request: RecruitmentRequest,
    }

    async fn world() -> World {
        let store = Arc::new(InMemoryStore::new());
        let dyn_store: Arc<dyn PassStore> = store.clone();
        let activity = ActivityService::new(dyn_store.clone());
        let interviews = InterviewService::new(dyn_store.clone());
        let candidates = CandidateService::new(dyn_store.clone(), activity.clone());
        let slots = SlotBookingService::new(
            dyn_store.clone(),
            interviews.clone(),
            candidates,
            activity.clone(),
        );
        let passes = PassService::new(dyn_store, activity, 3);

        let request = RecruitmentRequest {
            id: Uuid::new_v4(),
            title: "Site Reliability Engineer".into(),
            manager_id: Uuid::new_v4(),
            status: RequestStatus::Open,
            created_at: Utc::now(),
        };
        store.insert_request(request.clone()).await.unwrap();
        World {
            store,
            passes,
            interviews,
            slots,
            request,
        }
    }

    impl World {
        fn manager(&self) -> Caller {
            Caller::manager(self.request.manager_id)
        }

        async fn candidate(&self, name: &str, stage: Stage, status: Status) -> Uuid {
            let c = Candidate {
                id: Uuid::new_v4(),
                request_id: self.request.id,
                name: name.into(),
                stage,
                status,
                booked_slot: None,
                updated_at: Utc::now(),
            };
            let id = c.id;
            self.store.insert_candidate(c).await.unwrap();
            id
        }

        async fn setup_with_slots(&self, hours: &[u32]) -> (Uuid, Vec<Uuid>) {
            let setup = self
                .interviews
                .create_setup(
                    &self.manager(),
                    self.request.id,
                    CreateInterviewSetupPayload {
                        interview_rounds: 1,
                        interview_format: InterviewFormat::InPerson,
                        technical_assessment_required: false,
                    },
                )
                .await
                .unwrap();
            if hours.is_empty() {
                return (setup.id, Vec::new());
            }
            let created = self
                .slots
                .bulk_create(
                    &self.manager(),
                    setup.id,
                    BulkCreateSlotsPayload {
                        dates: vec![NaiveDate::from_ymd_opt(2026, 11, 9).unwrap()],
                        time_ranges: hours
                            .iter()
                            .map(|h| TimeRange {
                                start_time: NaiveTime::from_hms_opt(*h, 0, 0).unwrap(),
                                end_time: NaiveTime::from_hms_opt(*h + 1, 0, 0).unwrap(),
                            })
                            .collect(),
                        round_number: 1,
                    },
                )
                .await
                .unwrap();
            (setup.id, created.into_iter().map(|s| s.id).collect())
        }
    }

    #[tokio::test]
    async fn manager_actions_follow_guard_order() {
        let w = world().await;
        let pass = w.passes.manager_pass(&w.manager(), w.request.id).await.unwrap();
        assert_eq!(pass.next_action.unwrap().action_type, ActionType::ConfigureInterview);
        assert_eq!(pass.progress.stage, Stage::Application);

        w.setup_with_slots(&[]).await;
        let pass = w.passes.manager_pass(&w.manager(), w.request.id).await.unwrap();
        assert_eq!(pass.next_action.unwrap().action_type, ActionType::AddTimeSlots);

        let w = world().await;
        w.setup_with_slots(&[9]).await;
        w.candidate("Ira", Stage::Interview, Status::EvaluationPending).await;
        w.candidate("Jo", Stage::Interview, Status::EvaluationPending).await;
        let pass = w.passes.manager_pass(&w.manager(), w.request.id).await.unwrap();
        let action = pass.next_action.unwrap();
        assert_eq!(action.action_type, ActionType::ReviewCandidates);
        assert_eq!(action.label, "Review 2 Candidate(s)");
        assert_eq!(pass.progress.stage, Stage::Interview);
        assert_eq!(pass.progress.stage_index, 2);
    }

    #[tokio::test]
    async fn candidate_pass_hides_other_claims() {
        let w = world().await;
        let (_setup, slot_ids) = w.setup_with_slots(&[9, 10, 11]).await;
        let alice = w.candidate("Alice", Stage::Interview, Status::SlotSelectionPending).await;
        let bob = w.candidate("Bob", Stage::Interview, Status::SlotSelectionPending).await;
        w.slots.book(&Caller::candidate(alice), slot_ids[0], alice).await.unwrap();

        let bob_pass = w.passes.candidate_pass(&Caller::candidate(bob), bob).await.unwrap();
        assert_eq!(bob_pass.available_slots.len(), 2);
        assert!(bob_pass.available_slots.iter().all(|s| s.id != slot_ids[0]));
        assert!(bob_pass.booked_slot.is_none());
        assert_eq!(bob_pass.next_action.unwrap().action_type, ActionType::SelectSlot);
        assert_eq!(
            bob_pass.interview,
            Some(InterviewSummary {
                interview_rounds: 1,
                interview_format: InterviewFormat::InPerson,
                technical_assessment_required: false,
            })
        );

        let alice_pass = w.passes.candidate_pass(&Caller::candidate(alice), alice).await.unwrap();
        assert_eq!(alice_pass.status, Status::SlotBooked);
        assert_eq!(alice_pass.booked_slot.unwrap().id, slot_ids[0]);
        assert_eq!(alice_pass.next_action.unwrap().action_type, ActionType::ConfirmSlot);
        assert_eq!(alice_pass.recent_activity.len(), 2);
        assert_eq!(alice_pass.recent_activity[0].action_type, ActivityType::StageChanged);

        let manager_pass = w.passes.manager_pass(&w.manager(), w.request.id).await.unwrap();
        let claimed = manager_pass
            .slots
            .iter()
            .find(|s| s.id == slot_ids[0])
            .unwrap();
        assert_eq!(claimed.claimant_name.as_deref(), Some("Alice"));
        assert_eq!(manager_pass.available_slot_count, 2);
    }

    #[tokio::test]
    async fn pass_access_is_restricted() {
        let w = world().await;
        let alice = w.candidate("Alice", Stage::Application, Status::ProfileIncomplete).await;
        let bob = w.candidate("Bob", Stage::Application, Status::Submitted).await;

        let err = w.passes.candidate_pass(&Caller::candidate(bob), alice).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        let err = w
            .passes
            .manager_pass(&Caller::manager(Uuid::new_v4()), w.request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        let err = w
            .passes
            .candidate_pass(&w.manager(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let pass = w.passes.candidate_pass(&w.manager(), alice).await.unwrap();
        assert_eq!(pass.next_action.unwrap().action_type, ActionType::CompleteProfile);
        assert!(w.passes.candidate_pass(&Caller::hr(Uuid::new_v4()), alice).await.is_ok());
    }

    #[tokio::test]
    async fn delete_request_keeps_candidates_and_history() {
        let w = world().await;
        let (setup_id, slot_ids) = w.setup_with_slots(&[9, 10]).await;
        let alice = w.candidate("Alice", Stage::Interview, Status::SlotSelectionPending).await;
        w.slots.book(&Caller::candidate(alice), slot_ids[1], alice).await.unwrap();

        let summary = w.passes.delete_request(&w.manager(), w.request.id).await.unwrap();
        assert_eq!(summary.removed_slots, 2);
        assert_eq!(summary.affected_candidates, vec![alice]);
        assert!(w.store.get_setup(setup_id).await.unwrap().is_none());

        let pass = w.passes.candidate_pass(&Caller::candidate(alice), alice).await.unwrap();
        assert!(pass.position.is_none());
        assert!(pass.booked_slot.is_none());
        assert_eq!(pass.recent_activity[0].action_type, ActivityType::RequestClosed);

        let history = w.passes.activity(&Caller::candidate(alice), alice, Some(50)).await.unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn activity_limit_defaults_to_configured_value() {
        let w = world().await;
        let (_setup, slot_ids) = w.setup_with_slots(&[9, 10]).await;
        let alice = w.candidate("Alice", Stage::Interview, Status::SlotSelectionPending).await;
        let me = Caller::candidate(alice);
        w.slots.book(&me, slot_ids[0], alice).await.unwrap();
        w.slots.confirm(&me, slot_ids[0], alice).await.unwrap();

        assert_eq!(w.passes.activity(&me, alice, None).await.unwrap().len(), 3);
        assert_eq!(w.passes.activity(&me, alice, Some(0)).await.unwrap().len(), 1);
        assert_eq!(w.passes.activity(&me, alice, Some(10)).await.unwrap().len(), 4);
    }
}
