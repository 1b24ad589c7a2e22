//! Storage boundary for the pass engine.
//!
//! Every write to a slot's `status`/`claimed_by` pair goes through one of
//! `claim_slot`, `confirm_slot` or `cancel_slot`. Implementations must make
//! each of these a single atomic check-and-set; callers never read a slot
//! and then write it back.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::activity_log::ActivityLogEntry;
use crate::models::recruitment::{Candidate, InterviewSetup, RecruitmentRequest};
use crate::models::slot::{CancelOutcome, ClaimOutcome, ConfirmOutcome, InterviewSlot};
use crate::models::stage::{Stage, Status};

/// What a request deletion removed.
#[derive(Debug, Clone, Default)]
pub struct RequestTeardown {
    pub request: Option<RecruitmentRequest>,
    pub removed_slots: usize,
    /// Candidates of the request, after their booked slot was cleared.
    pub candidates: Vec<Candidate>,
}

#[async_trait]
pub trait PassStore: Send + Sync {
    async fn insert_request(&self, request: RecruitmentRequest) -> Result<()>;

    async fn get_request(&self, id: Uuid) -> Result<Option<RecruitmentRequest>>;

    /// Removes the request with its setup and slots. Candidates and
    /// activity entries are kept.
    async fn delete_request(&self, id: Uuid) -> Result<RequestTeardown>;

    async fn insert_candidate(&self, candidate: Candidate) -> Result<()>;

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;

    async fn list_candidates(&self, request_id: Uuid) -> Result<Vec<Candidate>>;

    /// Unconditional stage write. The pair must already be validated.
    async fn set_candidate_stage(
        &self,
        id: Uuid,
        stage: Stage,
        status: Status,
    ) -> Result<Option<Candidate>>;

    /// Writes `to` only when the candidate currently sits at `from`.
    /// Returns `None` when the candidate was elsewhere.
    async fn advance_candidate_if(
        &self,
        id: Uuid,
        from: (Stage, Status),
        to: (Stage, Status),
    ) -> Result<Option<Candidate>>;

    /// Returns `false` when the request already has a setup.
    async fn insert_setup(&self, setup: InterviewSetup) -> Result<bool>;

    async fn get_setup(&self, id: Uuid) -> Result<Option<InterviewSetup>>;

    async fn get_setup_for_request(&self, request_id: Uuid) -> Result<Option<InterviewSetup>>;

    async fn update_setup(&self, setup: InterviewSetup) -> Result<()>;

    async fn insert_slots(&self, slots: Vec<InterviewSlot>) -> Result<()>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<InterviewSlot>>;

    /// All slots of a setup ordered by date, start time, round.
    async fn list_slots(&self, setup_id: Uuid) -> Result<Vec<InterviewSlot>>;

    /// Atomic `available -> booked` for `candidate_id`, also setting the
    /// candidate's booked slot. Fails with `AlreadyHoldsRound` when the
    /// candidate has a live claim in the same setup round.
    async fn claim_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ClaimOutcome>;

    /// Atomic `booked -> confirmed` by the claimant.
    async fn confirm_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ConfirmOutcome>;

    /// Atomic `* -> cancelled`, releasing any claim. A claimant whose booked
    /// slot reference pointed here is re-pointed at their earliest remaining
    /// live claim, or cleared when none is left.
    async fn cancel_slot(&self, slot_id: Uuid) -> Result<CancelOutcome>;

    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<()>;

    /// Newest first.
    async fn recent_activity_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>>;

    /// Newest first, across every candidate of the request.
    async fn recent_activity_for_request(
        &self,
        request_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>>;
}
