use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::models::stage::{Stage, Status};

/// Raw names are parsed after deserialization so an unknown stage or status
/// is reported as a validation error rather than a JSON rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionCandidatePayload {
    #[validate(length(min = 1))]
    pub stage: String,
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

impl TransitionCandidatePayload {
    pub fn pair(&self) -> Result<(Stage, Status)> {
        Ok((self.stage.parse()?, self.status.parse()?))
    }
}
