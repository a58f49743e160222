use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn schedule_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/gettherapistschedule", get(handlers::therapist_schedule))
        .route("/getrehabilitatorschedule", get(handlers::rehabilitator_schedule))
        .route("/getpersonalscheduletherapist", get(handlers::personal_therapist_schedule))
        .route("/getpersonalschedulerehabilitator", get(handlers::personal_rehabilitator_schedule))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
