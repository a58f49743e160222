use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn healthcare_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/createhealthcare", post(handlers::create_healthcare))
        .route("/gethealthcare", get(handlers::get_healthcare))
        .route("/listhealthcares", get(handlers::list_healthcares))
        .route("/confirmchanges", post(handlers::confirm_changes))
        .route("/completehealthcare", post(handlers::complete_healthcare))
        .route("/clienthealthcaredocuments", post(handlers::client_healthcare_documents))
        .route("/healthcareupdate", post(handlers::update_healthcare))
        .route("/getpersonalactivity", get(handlers::personal_activity))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
