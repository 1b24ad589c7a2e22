use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

pub const SLOT_CONFLICT_MESSAGE: &str = "this slot is no longer available, please choose another";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    InvalidPayload(#[from] validator::ValidationErrors),

    #[error("{}", SLOT_CONFLICT_MESSAGE)]
    Conflict { slot_id: Uuid },

    #[error("Candidate already holds slot {slot_id} in round {round_number}")]
    AlreadyBookedInRound { slot_id: Uuid, round_number: i32 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable kind; clients branch on `slot_conflict`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) | Error::InvalidPayload(_) | Error::Json(_) => "validation",
            Error::Conflict { .. } => "slot_conflict",
            Error::AlreadyBookedInRound { .. } => "already_booked_in_round",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::InvariantViolation(_) => "invariant_violation",
            _ => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidPayload(_) | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Conflict { .. } | Error::AlreadyBookedInRound { .. } => StatusCode::CONFLICT,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_message = match &self {
            Error::InvariantViolation(msg) => {
                tracing::error!(error = %msg, "invariant violation reached a caller");
                "An unexpected error occurred".to_string()
            }
            Error::Database(err) => {
                tracing::error!(error = ?err, "database error");
                "An unexpected error occurred".to_string()
            }
            Error::Config(_) | Error::Migrate(_) | Error::Internal(_) | Error::Io(_) => {
                tracing::error!(error = %self, "internal error");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({ "error": error_message, "kind": self.kind() });
        if let Error::Conflict { slot_id } | Error::AlreadyBookedInRound { slot_id, .. } = &self {
            body["slot_id"] = json!(slot_id);
        }
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value as JsonValue;

    #[tokio::test]
    async fn conflict_is_distinguishable_from_other_failures() {
        let slot_id = Uuid::new_v4();
        let resp = Error::Conflict { slot_id }.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "slot_conflict");
        assert_eq!(body["error"], SLOT_CONFLICT_MESSAGE);
        assert_eq!(body["slot_id"], slot_id.to_string());

        let round = Error::AlreadyBookedInRound {
            slot_id,
            round_number: 1,
        };
        assert_eq!(round.status_code(), StatusCode::CONFLICT);
        assert_ne!(round.kind(), "slot_conflict");
    }

    #[tokio::test]
    async fn invariant_violation_is_not_leaked() {
        let resp = Error::InvariantViolation("slot x booked without claimant".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "invariant_violation");
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
