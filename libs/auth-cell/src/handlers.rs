use axum::extract::{Extension, Json, State};
use tracing::debug;

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{CreateUserRequest, User};
use crate::services::UserService;

pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    debug!("Registering user for principal {}", principal.id);

    let service = UserService::new(state.store.clone());
    let user = service.create_user(&principal.id, request).await?;

    Ok(Json(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.store.clone());
    let user = service.get_user(&principal.id).await?;

    Ok(Json(user))
}
