pub mod candidate_dto;
pub mod interview_dto;
pub mod pass_dto;
