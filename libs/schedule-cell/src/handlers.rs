use axum::extract::{Extension, Json, Query, State};

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{RehabilitatorScheduleQuery, ScheduleEntry, TherapistScheduleQuery};
use crate::services::ScheduleService;

pub async fn therapist_schedule(
    State(state): State<AppState>,
    Query(query): Query<TherapistScheduleQuery>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = ScheduleService::new(state.store.clone())
        .therapist_schedule(query.therapist_id.as_deref())
        .await?;

    Ok(Json(entries))
}

pub async fn rehabilitator_schedule(
    State(state): State<AppState>,
    Query(query): Query<RehabilitatorScheduleQuery>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = ScheduleService::new(state.store.clone())
        .rehabilitator_schedule(query.rehabilitator_id.as_deref())
        .await?;

    Ok(Json(entries))
}

pub async fn personal_therapist_schedule(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = ScheduleService::new(state.store.clone())
        .personal_therapist_schedule(&principal.id)
        .await?;

    Ok(Json(entries))
}

pub async fn personal_rehabilitator_schedule(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = ScheduleService::new(state.store.clone())
        .personal_rehabilitator_schedule(&principal.id)
        .await?;

    Ok(Json(entries))
}
