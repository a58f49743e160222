use axum::extract::{Extension, Json, Query, State};
use chrono::Utc;

use shared_database::UpdateResult;
use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    ActivityItem, CaseUpdateRequest, ClientDocumentsRequest, CreateHealthcareRequest, HealthcareCase,
    HealthcareCaseDetail, HealthcareIdParams,
};
use crate::services::case::parse_healthcare_id;
use crate::services::{ActivityService, HealthcareService};

pub async fn create_healthcare(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateHealthcareRequest>,
) -> Result<Json<HealthcareCase>, AppError> {
    let service = HealthcareService::new(state.store.clone());
    let case = service.create_case(&principal.id, request, Utc::now()).await?;

    Ok(Json(case))
}

pub async fn get_healthcare(
    State(state): State<AppState>,
    Query(params): Query<HealthcareIdParams>,
) -> Result<Json<HealthcareCaseDetail>, AppError> {
    let case_id = parse_healthcare_id(params.healthcare_id.as_deref())?;
    let detail = HealthcareService::new(state.store.clone()).get_case(case_id).await?;

    Ok(Json(detail))
}

pub async fn list_healthcares(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<HealthcareCase>>, AppError> {
    let cases = HealthcareService::new(state.store.clone())
        .list_cases(&principal.id)
        .await?;

    Ok(Json(cases))
}

pub async fn confirm_changes(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(params): Json<HealthcareIdParams>,
) -> Result<Json<UpdateResult>, AppError> {
    let case_id = parse_healthcare_id(params.healthcare_id.as_deref())?;
    let result = HealthcareService::new(state.store.clone())
        .confirm_changes(&principal.id, case_id)
        .await?;

    Ok(Json(result))
}

pub async fn complete_healthcare(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(params): Json<HealthcareIdParams>,
) -> Result<Json<UpdateResult>, AppError> {
    let case_id = parse_healthcare_id(params.healthcare_id.as_deref())?;
    let result = HealthcareService::new(state.store.clone())
        .complete_case(&principal.id, case_id)
        .await?;

    Ok(Json(result))
}

pub async fn client_healthcare_documents(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<ClientDocumentsRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = HealthcareService::new(state.store.clone())
        .attach_client_documents(&principal.id, request)
        .await?;

    Ok(Json(result))
}

pub async fn update_healthcare(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CaseUpdateRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = HealthcareService::new(state.store.clone())
        .extend_case(&principal.id, request)
        .await?;

    Ok(Json(result))
}

pub async fn personal_activity(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ActivityItem>>, AppError> {
    let activity = ActivityService::new(state.store.clone())
        .personal_activity(&principal.id)
        .await?;

    Ok(Json(activity))
}
