use axum::extract::{Extension, Json, Query, State};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AppointmentIdParams, CreateRehabilitatorAppointmentsRequest, CreateTherapistAppointmentRequest,
    RehabBookingOutcome, TherapistAppointment,
};
use crate::services::{parse_appointment_id, RehabBookingService, TherapistBookingService};

fn booking_service(state: &AppState) -> TherapistBookingService {
    TherapistBookingService::new(state.store.clone(), state.slot_locks.clone())
}

// ==============================================================================
// THERAPIST APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_therapist_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateTherapistAppointmentRequest>,
) -> Result<Json<TherapistAppointment>, AppError> {
    let appointment = booking_service(&state)
        .create_appointment(&principal.id, request, Utc::now())
        .await?;

    Ok(Json(appointment))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Query(params): Query<AppointmentIdParams>,
) -> Result<Json<TherapistAppointment>, AppError> {
    let appointment_id = parse_appointment_id(params.appointment_id.as_deref())?;
    let appointment = booking_service(&state).get_appointment(appointment_id).await?;

    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<AppointmentIdParams>,
) -> Result<Json<TherapistAppointment>, AppError> {
    let appointment_id = parse_appointment_id(params.appointment_id.as_deref())?;
    let cancelled = booking_service(&state)
        .cancel_appointment(&principal.id, appointment_id)
        .await?;

    Ok(Json(cancelled))
}

pub async fn accept_appointment(
    State(state): State<AppState>,
    Json(params): Json<AppointmentIdParams>,
) -> Result<Json<Vec<TherapistAppointment>>, AppError> {
    let appointment_id = parse_appointment_id(params.appointment_id.as_deref())?;
    let appointments = booking_service(&state)
        .accept_appointment(appointment_id, Utc::now())
        .await?;

    Ok(Json(appointments))
}

pub async fn decline_appointment(
    State(state): State<AppState>,
    Json(params): Json<AppointmentIdParams>,
) -> Result<Json<Vec<TherapistAppointment>>, AppError> {
    let appointment_id = parse_appointment_id(params.appointment_id.as_deref())?;
    let appointments = booking_service(&state)
        .decline_appointment(appointment_id, Utc::now())
        .await?;

    Ok(Json(appointments))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<TherapistAppointment>>, AppError> {
    debug!("Listing appointments for therapist {}", principal.id);

    let appointments = booking_service(&state)
        .list_for_therapist(&principal.id, Utc::now())
        .await?;

    Ok(Json(appointments))
}

// ==============================================================================
// REHABILITATOR SLOTS
// ==============================================================================

/// A batch that does not match the case's required session count is answered
/// with `success: false` rather than an error status.
pub async fn create_rehabilitator_appointments(
    State(state): State<AppState>,
    Json(request): Json<CreateRehabilitatorAppointmentsRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RehabBookingService::new(state.store.clone(), state.slot_locks.clone());

    let body = match service.book_slots(request).await? {
        RehabBookingOutcome::Booked(appointments) => json!({
            "success": true,
            "message": "Rehabilitator appointments booked.",
            "data": appointments,
        }),
        RehabBookingOutcome::CountMismatch { submitted, required } => json!({
            "success": false,
            "message": "Submitted amount of appointments is not equal to the required.",
            "submitted": submitted,
            "required": required,
        }),
    };

    Ok(Json(body))
}
