use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/createappointmenttherapist", post(handlers::create_therapist_appointment))
        .route("/createappointmentsrehabilitator", post(handlers::create_rehabilitator_appointments))
        .route("/getappointment", get(handlers::get_appointment))
        .route("/cancelappointment", delete(handlers::cancel_appointment))
        .route("/acceptappointmenttherapist", post(handlers::accept_appointment))
        .route("/declineappointmenttherapist", post(handlers::decline_appointment))
        .route("/getappointments", get(handlers::list_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
