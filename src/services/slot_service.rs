//! Slot inventory mutations.
//!
//! Booking, confirmation and cancellation each delegate the status change to
//! one atomic store call. Reads made beforehand only establish ownership
//! (which setup, which request); they never decide availability. A lost
//! booking race is reported as [`Error::Conflict`] straight away and is never
//! retried here.

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::database::store::PassStore;
use crate::dto::interview_dto::BulkCreateSlotsPayload;
use crate::dto::pass_dto::SlotView;
use crate::error::{Error, Result};
use crate::models::activity_log::{ActivityType, Actor, NewActivity};
use crate::models::caller::{Caller, CallerRole};
use crate::models::recruitment::{Candidate, InterviewSetup};
use crate::models::slot::{
    CancelOutcome, ClaimOutcome, ConfirmOutcome, InterviewSlot, SlotStatus,
};
use crate::models::stage::{Stage, Status};
use crate::services::activity_service::ActivityService;
use crate::services::candidate_service::CandidateService;
use crate::services::interview_service::InterviewService;

#[derive(Clone)]
pub struct SlotBookingService {
    store: Arc<dyn PassStore>,
    interviews: InterviewService,
    candidates: CandidateService,
    activity: ActivityService,
}

fn describe(slot: &InterviewSlot) -> String {
    format!(
        "{} {}-{} (round {})",
        slot.date,
        slot.start_time.format("%H:%M"),
        slot.end_time.format("%H:%M"),
        slot.round_number
    )
}

impl SlotBookingService {
    pub fn new(
        store: Arc<dyn PassStore>,
        interviews: InterviewService,
        candidates: CandidateService,
        activity: ActivityService,
    ) -> Self {
        Self {
            store,
            interviews,
            candidates,
            activity,
        }
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<InterviewSlot> {
        self.store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| Error::NotFound("Interview slot not found".into()))
    }

    /// Creates `dates x time_ranges` available slots for one round.
    /// Identical `(date, start, end)` triples within the call collapse.
    pub async fn bulk_create(
        &self,
        caller: &Caller,
        setup_id: Uuid,
        payload: BulkCreateSlotsPayload,
    ) -> Result<Vec<InterviewSlot>> {
        payload.validate()?;
        if let Some(bad) = payload
            .time_ranges
            .iter()
            .find(|range| range.start_time >= range.end_time)
        {
            return Err(Error::Validation(format!(
                "Time range {}-{} must start before it ends",
                bad.start_time, bad.end_time
            )));
        }

        let (setup, request) = self.interviews.managed_setup(caller, setup_id).await?;
        if request.status.is_closed() {
            return Err(Error::Validation(format!(
                "Recruitment request is {}",
                request.status.as_str()
            )));
        }
        if payload.round_number > setup.interview_rounds {
            return Err(Error::Validation(format!(
                "Round {} exceeds the {} configured interview round(s)",
                payload.round_number, setup.interview_rounds
            )));
        }

        let windows: BTreeSet<_> = payload
            .dates
            .iter()
            .flat_map(|date| {
                payload
                    .time_ranges
                    .iter()
                    .map(move |range| (*date, range.start_time, range.end_time))
            })
            .collect();

        let slots: Vec<InterviewSlot> = windows
            .into_iter()
            .map(|(date, start, end)| {
                InterviewSlot::available(setup.id, date, start, end, payload.round_number)
            })
            .collect();
        self.store.insert_slots(slots.clone()).await?;

        tracing::info!(
            setup_id = %setup_id,
            round = payload.round_number,
            created = slots.len(),
            "interview slots created"
        );
        Ok(slots)
    }

    /// Available slots of a setup, without claimant data.
    pub async fn list_available(
        &self,
        caller: &Caller,
        setup_id: Uuid,
        round: Option<i32>,
    ) -> Result<Vec<SlotView>> {
        let setup = self.interviews.get_setup(setup_id).await?;
        self.authorize_inventory_read(caller, &setup).await?;

        let slots = self.store.list_slots(setup_id).await?;
        Ok(slots
            .iter()
            .filter(|slot| slot.status == SlotStatus::Available)
            .filter(|slot| round.map_or(true, |r| slot.round_number == r))
            .map(SlotView::from)
            .collect())
    }

    async fn authorize_inventory_read(&self, caller: &Caller, setup: &InterviewSetup) -> Result<()> {
        let allowed = match caller.role {
            CallerRole::Candidate => self
                .store
                .get_candidate(caller.id)
                .await?
                .is_some_and(|c| c.request_id == setup.request_id),
            _ => {
                let request = self.interviews.get_request(setup.request_id).await?;
                caller.manages(&request)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::Forbidden("Not a participant of this recruitment request".into()))
        }
    }

    pub async fn book(&self, caller: &Caller, slot_id: Uuid, candidate_id: Uuid) -> Result<InterviewSlot> {
        if !caller.is_candidate(candidate_id) {
            return Err(Error::Forbidden("Candidates can only book slots for themselves".into()));
        }
        let candidate = self.candidates.get_candidate(candidate_id).await?;
        let slot = self.get_slot(slot_id).await?;
        let setup = self.interviews.get_setup(slot.setup_id).await?;
        if setup.request_id != candidate.request_id {
            return Err(Error::Forbidden(
                "Slot belongs to a different recruitment request".into(),
            ));
        }

        let booked = match self.store.claim_slot(slot_id, candidate_id).await? {
            ClaimOutcome::Claimed(slot) => slot,
            ClaimOutcome::Conflict => {
                tracing::info!(slot_id = %slot_id, candidate_id = %candidate_id, "slot claim lost to another candidate");
                return Err(Error::Conflict { slot_id });
            }
            ClaimOutcome::AlreadyHoldsRound {
                slot_id: held,
                round_number,
            } => {
                return Err(Error::AlreadyBookedInRound {
                    slot_id: held,
                    round_number,
                })
            }
            ClaimOutcome::NotFound => {
                return Err(Error::NotFound("Interview slot not found".into()))
            }
        };
        booked.check_claim_consistency()?;

        self.activity
            .record(NewActivity {
                candidate_id,
                request_id: candidate.request_id,
                stage: Stage::Interview,
                action_type: ActivityType::SlotBooked,
                description: format!("Booked interview slot {}", describe(&booked)),
                actor: Actor::Candidate(candidate_id),
            })
            .await?;
        self.candidates
            .advance_by_system(
                candidate_id,
                (Stage::Interview, Status::SlotSelectionPending),
                (Stage::Interview, Status::SlotBooked),
                "interview slot booked",
            )
            .await?;

        tracing::info!(slot_id = %slot_id, candidate_id = %candidate_id, "interview slot booked");
        Ok(booked)
    }

    /// Idempotent for the rightful claimant.
    pub async fn confirm(&self, caller: &Caller, slot_id: Uuid, candidate_id: Uuid) -> Result<InterviewSlot> {
        if !caller.is_candidate(candidate_id) {
            return Err(Error::Forbidden("Candidates can only confirm their own booking".into()));
        }
        let candidate = self.candidates.get_candidate(candidate_id).await?;

        let confirmed = match self.store.confirm_slot(slot_id, candidate_id).await? {
            ConfirmOutcome::Confirmed(slot) => slot,
            ConfirmOutcome::AlreadyConfirmed(slot) => return Ok(slot),
            ConfirmOutcome::NotClaimant => {
                return Err(Error::Forbidden("Slot is not booked by this candidate".into()))
            }
            ConfirmOutcome::Cancelled => return Err(Error::Conflict { slot_id }),
            ConfirmOutcome::Inconsistent(slot) => {
                slot.check_claim_consistency()?;
                return Err(Error::InvariantViolation(format!(
                    "slot {} reported inconsistent claim state",
                    slot.id
                )));
            }
            ConfirmOutcome::NotFound => {
                return Err(Error::NotFound("Interview slot not found".into()))
            }
        };

        self.activity
            .record(NewActivity {
                candidate_id,
                request_id: candidate.request_id,
                stage: Stage::Interview,
                action_type: ActivityType::SlotConfirmed,
                description: format!("Confirmed interview slot {}", describe(&confirmed)),
                actor: Actor::Candidate(candidate_id),
            })
            .await?;
        self.candidates
            .advance_by_system(
                candidate_id,
                (Stage::Interview, Status::SlotBooked),
                (Stage::Interview, Status::SlotConfirmed),
                "interview slot confirmed",
            )
            .await?;

        tracing::info!(slot_id = %slot_id, candidate_id = %candidate_id, "interview slot confirmed");
        Ok(confirmed)
    }

    /// Manager/HR cancellation of a slot in a request they manage.
    pub async fn cancel(&self, caller: &Caller, slot_id: Uuid, reason: Option<String>) -> Result<InterviewSlot> {
        let slot = self.get_slot(slot_id).await?;
        self.interviews.managed_setup(caller, slot.setup_id).await?;
        self.cancel_as(caller.as_actor(), slot_id, reason).await
    }

    pub async fn cancel_as(&self, actor: Actor, slot_id: Uuid, reason: Option<String>) -> Result<InterviewSlot> {
        let (cancelled, released) = match self.store.cancel_slot(slot_id).await? {
            CancelOutcome::Cancelled { slot, released } => (slot, released),
            CancelOutcome::AlreadyCancelled(slot) => return Ok(slot),
            CancelOutcome::NotFound => {
                return Err(Error::NotFound("Interview slot not found".into()))
            }
        };

        if let Some(candidate_id) = released {
            self.notify_released(actor, candidate_id, &cancelled, reason.as_deref())
                .await?;
        }

        tracing::info!(
            slot_id = %slot_id,
            released = ?released,
            actor = %actor,
            "interview slot cancelled"
        );
        Ok(cancelled)
    }

    async fn notify_released(
        &self,
        actor: Actor,
        candidate_id: Uuid,
        slot: &InterviewSlot,
        reason: Option<&str>,
    ) -> Result<()> {
        let Some(candidate) = self.store.get_candidate(candidate_id).await? else {
            tracing::warn!(candidate_id = %candidate_id, slot_id = %slot.id, "released claimant no longer exists");
            return Ok(());
        };

        let mut description = format!(
            "Interview slot {} was cancelled; please book another slot",
            describe(slot)
        );
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            description.push_str(&format!(" (reason: {})", reason));
        }
        self.activity
            .record(NewActivity {
                candidate_id,
                request_id: candidate.request_id,
                stage: candidate.stage,
                action_type: ActivityType::SlotCancelled,
                description,
                actor,
            })
            .await?;

        // The store re-points booked_slot at any claim held in another round.
        if let Some(held) = candidate.booked_slot {
            tracing::debug!(candidate_id = %candidate_id, slot_id = %held, "candidate still holds a live claim");
            return Ok(());
        }
        self.reopen_selection(&candidate).await
    }

    async fn reopen_selection(&self, candidate: &Candidate) -> Result<()> {
        for from in [Status::SlotBooked, Status::SlotConfirmed] {
            let moved = self
                .candidates
                .advance_by_system(
                    candidate.id,
                    (Stage::Interview, from),
                    (Stage::Interview, Status::SlotSelectionPending),
                    "booked interview slot was cancelled",
                )
                .await?;
            if moved.is_some() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryStore;
    use crate::dto::interview_dto::{
        CreateInterviewSetupPayload, TimeRange, UpdateInterviewSetupPayload,
    };
    use crate::models::recruitment::{InterviewFormat, RecruitmentRequest, RequestStatus};
    use chrono::{NaiveDate, NaiveTime, Utc};

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: SlotBookingService,
        interviews: InterviewService,
        request: RecruitmentRequest,
        setup: InterviewSetup,
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange {
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        }
    }

    async fn fixture(rounds: i32) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let dyn_store: Arc<dyn PassStore> = store.clone();
        let activity = ActivityService::new(dyn_store.clone());
        let interviews = InterviewService::new(dyn_store.clone());
        let candidates = CandidateService::new(dyn_store.clone(), activity.clone());
        let service = SlotBookingService::new(dyn_store, interviews.clone(), candidates, activity);

        let request = RecruitmentRequest {
            id: Uuid::new_v4(),
            title: "QA Engineer".into(),
            manager_id: Uuid::new_v4(),
            status: RequestStatus::Open,
            created_at: Utc::now(),
        };
        store.insert_request(request.clone()).await.unwrap();
        let setup = interviews
            .create_setup(
                &Caller::manager(request.manager_id),
                request.id,
                CreateInterviewSetupPayload {
                    interview_rounds: rounds,
                    interview_format: InterviewFormat::Online,
                    technical_assessment_required: false,
                },
            )
            .await
            .unwrap();

        Fixture {
            store,
            service,
            interviews,
            request,
            setup,
        }
    }

    impl Fixture {
        fn manager(&self) -> Caller {
            Caller::manager(self.request.manager_id)
        }

        async fn candidate(&self, name: &str) -> Uuid {
            let candidate = Candidate {
                id: Uuid::new_v4(),
                request_id: self.request.id,
                name: name.into(),
                stage: Stage::Interview,
                status: Status::SlotSelectionPending,
                booked_slot: None,
                updated_at: Utc::now(),
            };
            let id = candidate.id;
            self.store.insert_candidate(candidate).await.unwrap();
            id
        }

        async fn slots(&self, dates: Vec<NaiveDate>, ranges: Vec<TimeRange>, round: i32) -> Vec<InterviewSlot> {
            self.service
                .bulk_create(
                    &self.manager(),
                    self.setup.id,
                    BulkCreateSlotsPayload {
                        dates,
                        time_ranges: ranges,
                        round_number: round,
                    },
                )
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn bulk_create_is_cartesian_and_collapses_duplicates() {
        let fx = fixture(1).await;
        let created = fx
            .slots(
                vec![date(2), date(3)],
                vec![range(9, 10), range(10, 11), range(14, 15)],
                1,
            )
            .await;
        assert_eq!(created.len(), 6);
        assert!(created.iter().all(|s| s.status == SlotStatus::Available));

        let repeated = fx
            .service
            .bulk_create(
                &fx.manager(),
                fx.setup.id,
                BulkCreateSlotsPayload {
                    dates: vec![date(4), date(4)],
                    time_ranges: vec![range(9, 10), range(9, 10)],
                    round_number: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(repeated.len(), 1);
        assert_eq!(fx.store.list_slots(fx.setup.id).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn malformed_ranges_and_rounds_are_rejected_without_writes() {
        let fx = fixture(2).await;
        for payload in [
            BulkCreateSlotsPayload {
                dates: vec![date(2)],
                time_ranges: vec![range(9, 10), range(11, 11)],
                round_number: 1,
            },
            BulkCreateSlotsPayload {
                dates: vec![date(2)],
                time_ranges: vec![range(12, 10)],
                round_number: 1,
            },
            BulkCreateSlotsPayload {
                dates: vec![date(2)],
                time_ranges: vec![range(9, 10)],
                round_number: 3,
            },
        ] {
            let err = fx
                .service
                .bulk_create(&fx.manager(), fx.setup.id, payload)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        }

        let err = fx
            .service
            .bulk_create(
                &fx.manager(),
                fx.setup.id,
                BulkCreateSlotsPayload {
                    dates: vec![],
                    time_ranges: vec![range(9, 10)],
                    round_number: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
        assert!(fx.store.list_slots(fx.setup.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn book_conflict_confirm_cancel_scenario() {
        let fx = fixture(1).await;
        let slot = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let alice = fx.candidate("Alice").await;
        let bob = fx.candidate("Bob").await;

        let booked = fx.service.book(&Caller::candidate(alice), slot.id, alice).await.unwrap();
        assert_eq!(booked.status, SlotStatus::Booked);
        assert_eq!(booked.claimed_by, Some(alice));
        let alice_row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(alice_row.booked_slot, Some(slot.id));
        assert_eq!(alice_row.status, Status::SlotBooked);

        let err = fx.service.book(&Caller::candidate(bob), slot.id, bob).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { slot_id } if slot_id == slot.id));

        let confirmed = fx.service.confirm(&Caller::candidate(alice), slot.id, alice).await.unwrap();
        assert_eq!(confirmed.status, SlotStatus::Confirmed);
        let again = fx.service.confirm(&Caller::candidate(alice), slot.id, alice).await.unwrap();
        assert_eq!(again.status, SlotStatus::Confirmed);
        assert_eq!(again.claimed_by, Some(alice));

        let cancelled = fx
            .service
            .cancel(&fx.manager(), slot.id, Some("interviewer unavailable".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, SlotStatus::Cancelled);

        let alice_row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(alice_row.booked_slot, None);
        assert_eq!(alice_row.status, Status::SlotSelectionPending);

        let log = fx.store.recent_activity_for_candidate(alice, 20).await.unwrap();
        let cancel_entry = log
            .iter()
            .find(|e| e.action_type == ActivityType::SlotCancelled)
            .expect("cancellation is logged");
        assert!(cancel_entry.description.contains("interviewer unavailable"));
        assert_eq!(cancel_entry.actor, format!("manager:{}", fx.request.manager_id));
    }

    #[tokio::test]
    async fn confirming_someone_elses_booking_is_forbidden() {
        let fx = fixture(1).await;
        let slot = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let alice = fx.candidate("Alice").await;
        let bob = fx.candidate("Bob").await;
        fx.service.book(&Caller::candidate(alice), slot.id, alice).await.unwrap();

        let err = fx.service.confirm(&Caller::candidate(bob), slot.id, bob).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let err = fx.service.confirm(&Caller::candidate(bob), slot.id, alice).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let unbooked = fx.slots(vec![date(3)], vec![range(9, 10)], 1).await.remove(0);
        let err = fx.service.confirm(&Caller::candidate(bob), unbooked.id, bob).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn one_active_booking_per_round() {
        let fx = fixture(2).await;
        let round_one = fx.slots(vec![date(2)], vec![range(9, 10), range(10, 11)], 1).await;
        let round_two = fx.slots(vec![date(5)], vec![range(9, 10)], 2).await;
        let alice = fx.candidate("Alice").await;
        let me = Caller::candidate(alice);

        fx.service.book(&me, round_one[0].id, alice).await.unwrap();
        let err = fx.service.book(&me, round_one[1].id, alice).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyBookedInRound { slot_id, round_number: 1 } if slot_id == round_one[0].id
        ));

        fx.service.book(&me, round_two[0].id, alice).await.unwrap();

        fx.service.cancel(&fx.manager(), round_one[0].id, None).await.unwrap();
        let rebooked = fx.service.book(&me, round_one[1].id, alice).await.unwrap();
        assert_eq!(rebooked.claimed_by, Some(alice));
    }

    #[tokio::test]
    async fn cancelling_one_round_keeps_claim_in_other_round() {
        let fx = fixture(2).await;
        let round_one = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let round_two = fx.slots(vec![date(5)], vec![range(9, 10)], 2).await.remove(0);
        let alice = fx.candidate("Alice").await;
        let me = Caller::candidate(alice);

        fx.service.book(&me, round_one.id, alice).await.unwrap();
        fx.service.book(&me, round_two.id, alice).await.unwrap();
        fx.service.cancel(&fx.manager(), round_two.id, None).await.unwrap();

        let kept = fx.store.get_slot(round_one.id).await.unwrap().unwrap();
        assert_eq!(kept.status, SlotStatus::Booked);
        assert_eq!(kept.claimed_by, Some(alice));
        let row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(row.booked_slot, Some(round_one.id));
        assert_eq!(row.status, Status::SlotBooked);

        let confirmed = fx.service.confirm(&me, round_one.id, alice).await.unwrap();
        assert_eq!(confirmed.status, SlotStatus::Confirmed);
    }

    #[tokio::test]
    async fn cancelling_unreferenced_claim_leaves_status_alone() {
        let fx = fixture(2).await;
        let round_one = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let round_two = fx.slots(vec![date(5)], vec![range(9, 10)], 2).await.remove(0);
        let alice = fx.candidate("Alice").await;
        let me = Caller::candidate(alice);

        fx.service.book(&me, round_one.id, alice).await.unwrap();
        fx.service.book(&me, round_two.id, alice).await.unwrap();
        fx.service.cancel(&fx.manager(), round_one.id, None).await.unwrap();

        let row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(row.booked_slot, Some(round_two.id));
        assert_eq!(row.status, Status::SlotBooked);

        fx.service.cancel(&fx.manager(), round_two.id, None).await.unwrap();
        let row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(row.booked_slot, None);
        assert_eq!(row.status, Status::SlotSelectionPending);
    }

    #[tokio::test]
    async fn reducing_rounds_leaves_existing_bookings_intact() {
        let fx = fixture(2).await;
        let round_two = fx.slots(vec![date(5)], vec![range(9, 10)], 2).await.remove(0);
        let alice = fx.candidate("Alice").await;
        fx.service.book(&Caller::candidate(alice), round_two.id, alice).await.unwrap();

        let updated = fx
            .interviews
            .update_setup(
                &fx.manager(),
                fx.setup.id,
                UpdateInterviewSetupPayload {
                    interview_rounds: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.interview_rounds, 1);

        let slot = fx.store.get_slot(round_two.id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Booked);
        assert_eq!(slot.claimed_by, Some(alice));
        let row = fx.store.get_candidate(alice).await.unwrap().unwrap();
        assert_eq!(row.booked_slot, Some(round_two.id));
        assert_eq!(row.status, Status::SlotBooked);

        let err = fx
            .service
            .bulk_create(
                &fx.manager(),
                fx.setup.id,
                BulkCreateSlotsPayload {
                    dates: vec![date(6)],
                    time_ranges: vec![range(9, 10)],
                    round_number: 2,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn booking_requires_matching_caller_and_request() {
        let fx = fixture(1).await;
        let slot = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let alice = fx.candidate("Alice").await;

        let err = fx.service.book(&fx.manager(), slot.id, alice).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let outsider = Candidate {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            name: "Eve".into(),
            stage: Stage::Interview,
            status: Status::SlotSelectionPending,
            booked_slot: None,
            updated_at: Utc::now(),
        };
        let outsider_id = outsider.id;
        fx.store.insert_candidate(outsider).await.unwrap();
        let err = fx
            .service
            .book(&Caller::candidate(outsider_id), slot.id, outsider_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let err = fx
            .service
            .book(&Caller::candidate(alice), Uuid::new_v4(), alice)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn cancelled_slot_cannot_be_booked_or_confirmed() {
        let fx = fixture(1).await;
        let slot = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);
        let alice = fx.candidate("Alice").await;
        fx.service.cancel_as(Actor::System, slot.id, None).await.unwrap();

        let err = fx.service.book(&Caller::candidate(alice), slot.id, alice).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        let err = fx.service.confirm(&Caller::candidate(alice), slot.id, alice).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let again = fx.service.cancel_as(Actor::System, slot.id, None).await.unwrap();
        assert_eq!(again.status, SlotStatus::Cancelled);
    }

    #[tokio::test]
    async fn available_listing_hides_claims() {
        let fx = fixture(2).await;
        let created = fx.slots(vec![date(2)], vec![range(9, 10), range(10, 11)], 1).await;
        fx.slots(vec![date(3)], vec![range(9, 10)], 2).await;
        let alice = fx.candidate("Alice").await;
        fx.service.book(&Caller::candidate(alice), created[0].id, alice).await.unwrap();

        let visible = fx
            .service
            .list_available(&Caller::candidate(alice), fx.setup.id, Some(1))
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, created[1].id);

        let all = fx
            .service
            .list_available(&fx.manager(), fx.setup.id, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let err = fx
            .service
            .list_available(&Caller::candidate(Uuid::new_v4()), fx.setup.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn inconsistent_slot_surfaces_invariant_violation() {
        let fx = fixture(1).await;
        let alice = fx.candidate("Alice").await;
        let mut corrupt = InterviewSlot::available(
            fx.setup.id,
            date(2),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            1,
        );
        corrupt.status = SlotStatus::Booked;
        let corrupt_id = corrupt.id;
        fx.store.insert_slots(vec![corrupt]).await.unwrap();

        let err = fx
            .service
            .confirm(&Caller::candidate(alice), corrupt_id, alice)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_have_exactly_one_winner() {
        let fx = fixture(1).await;
        let slot = fx.slots(vec![date(2)], vec![range(9, 10)], 1).await.remove(0);

        let mut contenders = Vec::new();
        for i in 0..16 {
            contenders.push(fx.candidate(&format!("Candidate {}", i)).await);
        }

        let mut handles = Vec::new();
        for candidate_id in contenders.iter().copied() {
            let service = fx.service.clone();
            let slot_id = slot.id;
            handles.push(tokio::spawn(async move {
                (
                    candidate_id,
                    service
                        .book(&Caller::candidate(candidate_id), slot_id, candidate_id)
                        .await,
                )
            }));
        }

        let mut winners = Vec::new();
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                (id, Ok(_)) => winners.push(id),
                (_, Err(Error::Conflict { .. })) => conflicts += 1,
                (_, Err(other)) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(conflicts, contenders.len() - 1);

        let stored = fx.store.get_slot(slot.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SlotStatus::Booked);
        assert_eq!(stored.claimed_by, Some(winners[0]));

        let mut holders = 0;
        for id in &contenders {
            if fx.store.get_candidate(*id).await.unwrap().unwrap().booked_slot == Some(slot.id) {
                holders += 1;
            }
        }
        assert_eq!(holders, 1);
    }
}
