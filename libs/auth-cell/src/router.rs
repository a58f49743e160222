use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn auth_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/createuser", post(handlers::create_user))
        .route("/getuser", get(handlers::get_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
