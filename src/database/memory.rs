//! In-process implementation of [`PassStore`].
//!
//! Requests, candidates, setups and slots share one `RwLock`, so a slot
//! transition and the matching candidate back-reference change together
//! inside one write guard. Nothing awaits while a guard is held.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{PassStore, RequestTeardown};
use crate::error::Result;
use crate::models::activity_log::ActivityLogEntry;
use crate::models::recruitment::{Candidate, InterviewSetup, RecruitmentRequest};
use crate::models::slot::{
    CancelOutcome, ClaimOutcome, ConfirmOutcome, InterviewSlot, SlotStatus,
};
use crate::models::stage::{Stage, Status};

#[derive(Default)]
struct Inventory {
    requests: HashMap<Uuid, RecruitmentRequest>,
    candidates: HashMap<Uuid, Candidate>,
    setups: HashMap<Uuid, InterviewSetup>,
    slots: HashMap<Uuid, InterviewSlot>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inventory: RwLock<Inventory>,
    activity: RwLock<Vec<ActivityLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_slots(slots: &mut [InterviewSlot]) {
    slots.sort_by(|a, b| {
        (a.date, a.start_time, a.round_number).cmp(&(b.date, b.start_time, b.round_number))
    });
}

/// The candidate's first booked/confirmed slot in any round, if one is left.
fn earliest_live_claim(slots: &HashMap<Uuid, InterviewSlot>, candidate_id: Uuid) -> Option<Uuid> {
    slots
        .values()
        .filter(|s| s.claimed_by == Some(candidate_id) && s.status.is_claimed())
        .min_by_key(|s| (s.date, s.start_time, s.round_number))
        .map(|s| s.id)
}

fn newest_first<'a>(
    entries: impl DoubleEndedIterator<Item = &'a ActivityLogEntry>,
    limit: usize,
) -> Vec<ActivityLogEntry> {
    entries.rev().take(limit).cloned().collect()
}

#[async_trait]
impl PassStore for InMemoryStore {
    async fn insert_request(&self, request: RecruitmentRequest) -> Result<()> {
        let mut inv = self.inventory.write().await;
        inv.requests.insert(request.id, request);
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<RecruitmentRequest>> {
        let inv = self.inventory.read().await;
        Ok(inv.requests.get(&id).cloned())
    }

    async fn delete_request(&self, id: Uuid) -> Result<RequestTeardown> {
        let mut guard = self.inventory.write().await;
        let inv = &mut *guard;
        let Some(request) = inv.requests.remove(&id) else {
            return Ok(RequestTeardown::default());
        };

        let setup_ids: Vec<Uuid> = inv
            .setups
            .values()
            .filter(|s| s.request_id == id)
            .map(|s| s.id)
            .collect();
        inv.setups.retain(|_, s| s.request_id != id);

        let before = inv.slots.len();
        let removed: Vec<Uuid> = inv
            .slots
            .values()
            .filter(|slot| setup_ids.contains(&slot.setup_id))
            .map(|slot| slot.id)
            .collect();
        inv.slots.retain(|_, slot| !setup_ids.contains(&slot.setup_id));
        let removed_slots = before - inv.slots.len();

        let now = Utc::now();
        let mut candidates = Vec::new();
        for candidate in inv.candidates.values_mut().filter(|c| c.request_id == id) {
            if candidate.booked_slot.is_some_and(|s| removed.contains(&s)) {
                candidate.booked_slot = None;
                candidate.updated_at = now;
            }
            candidates.push(candidate.clone());
        }

        Ok(RequestTeardown {
            request: Some(request),
            removed_slots,
            candidates,
        })
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<()> {
        let mut inv = self.inventory.write().await;
        inv.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let inv = self.inventory.read().await;
        Ok(inv.candidates.get(&id).cloned())
    }

    async fn list_candidates(&self, request_id: Uuid) -> Result<Vec<Candidate>> {
        let inv = self.inventory.read().await;
        let mut out: Vec<Candidate> = inv
            .candidates
            .values()
            .filter(|c| c.request_id == request_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn set_candidate_stage(
        &self,
        id: Uuid,
        stage: Stage,
        status: Status,
    ) -> Result<Option<Candidate>> {
        let mut inv = self.inventory.write().await;
        Ok(inv.candidates.get_mut(&id).map(|c| {
            c.stage = stage;
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn advance_candidate_if(
        &self,
        id: Uuid,
        from: (Stage, Status),
        to: (Stage, Status),
    ) -> Result<Option<Candidate>> {
        let mut inv = self.inventory.write().await;
        Ok(inv
            .candidates
            .get_mut(&id)
            .filter(|c| (c.stage, c.status) == from)
            .map(|c| {
                c.stage = to.0;
                c.status = to.1;
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn insert_setup(&self, setup: InterviewSetup) -> Result<bool> {
        let mut inv = self.inventory.write().await;
        if inv.setups.values().any(|s| s.request_id == setup.request_id) {
            return Ok(false);
        }
        inv.setups.insert(setup.id, setup);
        Ok(true)
    }

    async fn get_setup(&self, id: Uuid) -> Result<Option<InterviewSetup>> {
        let inv = self.inventory.read().await;
        Ok(inv.setups.get(&id).cloned())
    }

    async fn get_setup_for_request(&self, request_id: Uuid) -> Result<Option<InterviewSetup>> {
        let inv = self.inventory.read().await;
        Ok(inv
            .setups
            .values()
            .find(|s| s.request_id == request_id)
            .cloned())
    }

    async fn update_setup(&self, setup: InterviewSetup) -> Result<()> {
        let mut inv = self.inventory.write().await;
        inv.setups.insert(setup.id, setup);
        Ok(())
    }

    async fn insert_slots(&self, slots: Vec<InterviewSlot>) -> Result<()> {
        let mut inv = self.inventory.write().await;
        for slot in slots {
            inv.slots.insert(slot.id, slot);
        }
        Ok(())
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<InterviewSlot>> {
        let inv = self.inventory.read().await;
        Ok(inv.slots.get(&id).cloned())
    }

    async fn list_slots(&self, setup_id: Uuid) -> Result<Vec<InterviewSlot>> {
        let inv = self.inventory.read().await;
        let mut out: Vec<InterviewSlot> = inv
            .slots
            .values()
            .filter(|s| s.setup_id == setup_id)
            .cloned()
            .collect();
        sort_slots(&mut out);
        Ok(out)
    }

    async fn claim_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ClaimOutcome> {
        let mut guard = self.inventory.write().await;
        let inv = &mut *guard;

        let Some(slot) = inv.slots.get(&slot_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if slot.status != SlotStatus::Available {
            return Ok(ClaimOutcome::Conflict);
        }
        let (setup_id, round_number) = (slot.setup_id, slot.round_number);

        if let Some(held) = inv.slots.values().find(|s| {
            s.setup_id == setup_id
                && s.round_number == round_number
                && s.claimed_by == Some(candidate_id)
                && s.status.is_claimed()
        }) {
            return Ok(ClaimOutcome::AlreadyHoldsRound {
                slot_id: held.id,
                round_number,
            });
        }

        let now = Utc::now();
        let Some(slot) = inv.slots.get_mut(&slot_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        slot.status = SlotStatus::Booked;
        slot.claimed_by = Some(candidate_id);
        slot.updated_at = now;
        let claimed = slot.clone();

        if let Some(candidate) = inv.candidates.get_mut(&candidate_id) {
            candidate.booked_slot = Some(slot_id);
            candidate.updated_at = now;
        }
        Ok(ClaimOutcome::Claimed(claimed))
    }

    async fn confirm_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ConfirmOutcome> {
        let mut inv = self.inventory.write().await;
        let Some(slot) = inv.slots.get_mut(&slot_id) else {
            return Ok(ConfirmOutcome::NotFound);
        };
        let outcome = match (slot.status, slot.claimed_by) {
            (SlotStatus::Cancelled, _) => ConfirmOutcome::Cancelled,
            (SlotStatus::Booked | SlotStatus::Confirmed, None) => {
                ConfirmOutcome::Inconsistent(slot.clone())
            }
            (SlotStatus::Booked, Some(owner)) if owner == candidate_id => {
                slot.status = SlotStatus::Confirmed;
                slot.updated_at = Utc::now();
                ConfirmOutcome::Confirmed(slot.clone())
            }
            (SlotStatus::Confirmed, Some(owner)) if owner == candidate_id => {
                ConfirmOutcome::AlreadyConfirmed(slot.clone())
            }
            _ => ConfirmOutcome::NotClaimant,
        };
        Ok(outcome)
    }

    async fn cancel_slot(&self, slot_id: Uuid) -> Result<CancelOutcome> {
        let mut guard = self.inventory.write().await;
        let inv = &mut *guard;
        let Some(slot) = inv.slots.get_mut(&slot_id) else {
            return Ok(CancelOutcome::NotFound);
        };
        if slot.status == SlotStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled(slot.clone()));
        }

        let now = Utc::now();
        let released = slot.claimed_by.take();
        slot.status = SlotStatus::Cancelled;
        slot.updated_at = now;
        let cancelled = slot.clone();

        if let Some(candidate_id) = released {
            let remaining = earliest_live_claim(&inv.slots, candidate_id);
            if let Some(candidate) = inv.candidates.get_mut(&candidate_id) {
                if candidate.booked_slot == Some(slot_id) {
                    candidate.booked_slot = remaining;
                    candidate.updated_at = now;
                }
            }
        }
        Ok(CancelOutcome::Cancelled {
            slot: cancelled,
            released,
        })
    }

    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<()> {
        self.activity.write().await.push(entry);
        Ok(())
    }

    async fn recent_activity_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        let log = self.activity.read().await;
        Ok(newest_first(
            log.iter().filter(|e| e.candidate_id == candidate_id),
            limit,
        ))
    }

    async fn recent_activity_for_request(
        &self,
        request_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        let log = self.activity.read().await;
        Ok(newest_first(
            log.iter().filter(|e| e.request_id == request_id),
            limit,
        ))
    }
}
