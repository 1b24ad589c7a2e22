pub mod candidate;
pub mod health;
pub mod interview;
pub mod pass;
pub mod slot;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::{middleware::auth::require_bearer_auth, AppState};

/// Full HTTP surface. `/health` is public; everything under `/api` needs a
/// bearer token.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/candidates/:id/pass", get(pass::get_candidate_pass))
        .route("/api/candidates/:id/activity", get(pass::get_activity))
        .route("/api/candidates/:id/stage", post(candidate::transition_candidate))
        .route("/api/requests/:id/pass", get(pass::get_manager_pass))
        .route("/api/requests/:id", delete(pass::delete_request))
        .route(
            "/api/requests/:id/interview-setup",
            post(interview::create_interview_setup),
        )
        .route(
            "/api/interview-setups/:id",
            patch(interview::update_interview_setup),
        )
        .route(
            "/api/interview-setups/:id/slots",
            get(slot::list_available_slots).post(slot::bulk_create_slots),
        )
        .route("/api/slots/:id/book", post(slot::book_slot))
        .route("/api/slots/:id/confirm", post(slot::confirm_slot))
        .route("/api/slots/:id/cancel", post(slot::cancel_slot))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
