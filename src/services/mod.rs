pub mod action_resolver;
pub mod activity_service;
pub mod candidate_service;
pub mod interview_service;
pub mod pass_service;
pub mod slot_service;
