pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::database::store::PassStore;
use crate::services::{
    activity_service::ActivityService, candidate_service::CandidateService,
    interview_service::InterviewService, pass_service::PassService,
    slot_service::SlotBookingService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PassStore>,
    pub jwt_secret: Arc<str>,
    pub activity_service: ActivityService,
    pub candidate_service: CandidateService,
    pub interview_service: InterviewService,
    pub slot_service: SlotBookingService,
    pub pass_service: PassService,
}

impl AppState {
    pub fn new(store: Arc<dyn PassStore>, jwt_secret: &str, activity_limit: usize) -> Self {
        let activity_service = ActivityService::new(store.clone());
        let candidate_service = CandidateService::new(store.clone(), activity_service.clone());
        let interview_service = InterviewService::new(store.clone());
        let slot_service = SlotBookingService::new(
            store.clone(),
            interview_service.clone(),
            candidate_service.clone(),
            activity_service.clone(),
        );
        let pass_service = PassService::new(store.clone(), activity_service.clone(), activity_limit);

        Self {
            store,
            jwt_secret: Arc::from(jwt_secret),
            activity_service,
            candidate_service,
            interview_service,
            slot_service,
            pass_service,
        }
    }
}
