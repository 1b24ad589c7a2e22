use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::database::store::PassStore;
use crate::dto::interview_dto::{CreateInterviewSetupPayload, UpdateInterviewSetupPayload};
use crate::error::{Error, Result};
use crate::models::caller::Caller;
use crate::models::recruitment::{InterviewSetup, RecruitmentRequest};

#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn PassStore>,
}

impl InterviewService {
    pub fn new(store: Arc<dyn PassStore>) -> Self {
        Self { store }
    }

    pub async fn get_request(&self, id: Uuid) -> Result<RecruitmentRequest> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| Error::NotFound("Recruitment request not found".into()))
    }

    pub async fn get_setup(&self, id: Uuid) -> Result<InterviewSetup> {
        self.store
            .get_setup(id)
            .await?
            .ok_or_else(|| Error::NotFound("Interview setup not found".into()))
    }

    /// Loads a setup and its request, requiring the caller to manage it.
    pub async fn managed_setup(
        &self,
        caller: &Caller,
        setup_id: Uuid,
    ) -> Result<(InterviewSetup, RecruitmentRequest)> {
        let setup = self.get_setup(setup_id).await?;
        let request = self.get_request(setup.request_id).await?;
        if !caller.manages(&request) {
            return Err(Error::Forbidden(
                "Only the hiring manager can manage this interview setup".into(),
            ));
        }
        Ok((setup, request))
    }

    pub async fn create_setup(
        &self,
        caller: &Caller,
        request_id: Uuid,
        payload: CreateInterviewSetupPayload,
    ) -> Result<InterviewSetup> {
        payload.validate()?;

        let request = self.get_request(request_id).await?;
        if !caller.manages(&request) {
            return Err(Error::Forbidden(
                "Only the hiring manager can configure interviews".into(),
            ));
        }
        if request.status.is_closed() {
            return Err(Error::Validation(format!(
                "Recruitment request is {}",
                request.status.as_str()
            )));
        }

        let now = Utc::now();
        let setup = InterviewSetup {
            id: Uuid::new_v4(),
            request_id,
            interview_rounds: payload.interview_rounds,
            interview_format: payload.interview_format,
            technical_assessment_required: payload.technical_assessment_required,
            created_by: caller.id,
            created_at: now,
            updated_at: now,
        };
        if !self.store.insert_setup(setup.clone()).await? {
            return Err(Error::Validation(
                "Interview setup already exists for this request; edit it instead".into(),
            ));
        }

        tracing::info!(
            request_id = %request_id,
            setup_id = %setup.id,
            rounds = setup.interview_rounds,
            format = setup.interview_format.as_str(),
            "interview setup created"
        );
        Ok(setup)
    }

    /// Manager edit. Existing slots and bookings are left untouched, even
    /// when the round count drops below a booked slot's round.
    pub async fn update_setup(
        &self,
        caller: &Caller,
        setup_id: Uuid,
        payload: UpdateInterviewSetupPayload,
    ) -> Result<InterviewSetup> {
        payload.validate()?;

        let (mut setup, _request) = self.managed_setup(caller, setup_id).await?;
        if let Some(rounds) = payload.interview_rounds {
            setup.interview_rounds = rounds;
        }
        if let Some(format) = payload.interview_format {
            setup.interview_format = format;
        }
        if let Some(required) = payload.technical_assessment_required {
            setup.technical_assessment_required = required;
        }
        setup.updated_at = Utc::now();
        self.store.update_setup(setup.clone()).await?;

        tracing::info!(setup_id = %setup_id, rounds = setup.interview_rounds, "interview setup updated");
        Ok(setup)
    }
}
