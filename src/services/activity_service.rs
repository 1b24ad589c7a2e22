use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::PassStore;
use crate::error::Result;
use crate::models::activity_log::{ActivityLogEntry, NewActivity};

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn PassStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn PassStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, activity: NewActivity) -> Result<ActivityLogEntry> {
        let entry = activity.into_entry();
        self.store.append_activity(entry.clone()).await?;
        tracing::debug!(
            candidate_id = %entry.candidate_id,
            action_type = entry.action_type.as_str(),
            actor = %entry.actor,
            "activity recorded"
        );
        Ok(entry)
    }

    pub async fn recent_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        self.store
            .recent_activity_for_candidate(candidate_id, limit)
            .await
    }

    pub async fn recent_for_request(
        &self,
        request_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        self.store.recent_activity_for_request(request_id, limit).await
    }
}
