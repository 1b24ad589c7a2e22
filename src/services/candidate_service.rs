use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::PassStore;
use crate::error::{Error, Result};
use crate::models::activity_log::{ActivityType, Actor, NewActivity};
use crate::models::caller::Caller;
use crate::models::recruitment::Candidate;
use crate::models::stage::{validate_pair, Stage, Status};
use crate::services::activity_service::ActivityService;

/// Stage/status transitions. Candidates never move themselves; HR, the
/// owning manager, or the engine's own rules do.
#[derive(Clone)]
pub struct CandidateService {
    store: Arc<dyn PassStore>,
    activity: ActivityService,
}

impl CandidateService {
    pub fn new(store: Arc<dyn PassStore>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Candidate> {
        self.store
            .get_candidate(id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".into()))
    }

    pub async fn transition(
        &self,
        caller: &Caller,
        candidate_id: Uuid,
        stage: Stage,
        status: Status,
        note: Option<String>,
    ) -> Result<Candidate> {
        validate_pair(stage, status)?;

        let candidate = self.get_candidate(candidate_id).await?;
        let allowed = match self.store.get_request(candidate.request_id).await? {
            Some(request) => caller.manages(&request),
            None => caller.is_staff(),
        };
        if !allowed {
            return Err(Error::Forbidden(
                "Only HR or the hiring manager can move this candidate".into(),
            ));
        }

        let updated = self
            .store
            .set_candidate_stage(candidate_id, stage, status)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;

        let mut description = format!(
            "Moved from {}/{} to {}/{}",
            candidate.stage, candidate.status, stage, status
        );
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            description.push_str(": ");
            description.push_str(note.trim());
        }
        self.activity
            .record(NewActivity {
                candidate_id,
                request_id: updated.request_id,
                stage,
                action_type: ActivityType::StageChanged,
                description,
                actor: caller.as_actor(),
            })
            .await?;

        tracing::info!(
            candidate_id = %candidate_id,
            stage = %stage,
            status = %status,
            actor = %caller.as_actor(),
            "candidate stage changed"
        );
        Ok(updated)
    }

    /// Automated rule: move only if the candidate still sits at `from`.
    pub async fn advance_by_system(
        &self,
        candidate_id: Uuid,
        from: (Stage, Status),
        to: (Stage, Status),
        reason: &str,
    ) -> Result<Option<Candidate>> {
        validate_pair(to.0, to.1)?;

        let Some(updated) = self
            .store
            .advance_candidate_if(candidate_id, from, to)
            .await?
        else {
            return Ok(None);
        };

        self.activity
            .record(NewActivity {
                candidate_id,
                request_id: updated.request_id,
                stage: to.0,
                action_type: ActivityType::StageChanged,
                description: format!(
                    "Moved from {}/{} to {}/{}: {}",
                    from.0, from.1, to.0, to.1, reason
                ),
                actor: Actor::System,
            })
            .await?;
        Ok(Some(updated))
    }
}
