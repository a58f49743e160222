use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::{IdentityResolver, UserRole};
use shared_database::{Collection, Filter, RecordStore};
use shared_utils::locks::{guard_for, SlotLocks};

use crate::models::{
    AppointmentError, AppointmentStatus, CreateTherapistAppointmentRequest, TherapistAppointment,
};
use crate::services::conflict::{parse_appointments, SlotAvailabilityChecker};
use crate::services::lifecycle::is_upcoming;

pub struct TherapistBookingService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
    availability: SlotAvailabilityChecker,
    slot_locks: Option<Arc<SlotLocks>>,
}

impl TherapistBookingService {
    pub fn new(store: Arc<dyn RecordStore>, slot_locks: Option<Arc<SlotLocks>>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            availability: SlotAvailabilityChecker::new(Arc::clone(&store)),
            store,
            slot_locks,
        }
    }

    /// Books a Pending appointment for the calling client with the named
    /// therapist.
    pub async fn create_appointment(
        &self,
        principal_id: &str,
        request: CreateTherapistAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<TherapistAppointment, AppointmentError> {
        let (professional_name, information, start_time, end_time) = validate_create_request(request)?;

        let professional = self.identity
            .resolve_professional_by_full_name(&professional_name, Some(UserRole::Therapist))
            .await?;
        let client = self.identity.resolve_current_user(principal_id).await?;

        let professional_name = professional.display_name();
        let client_name = client.display_name();

        let _guard = guard_for(self.slot_locks.as_ref(), &professional_name).await;

        if self.availability.has_existing_active_booking(&client_name, now).await? {
            warn!("{} already has an active therapist appointment", client_name);
            return Err(AppointmentError::ActiveBookingExists);
        }

        if self.availability.has_conflict(&professional_name, start_time).await? {
            return Err(AppointmentError::SlotTaken);
        }

        if professional_name == client_name || client.role.is_professional() {
            warn!("{} tried to book their own appointment", client_name);
            return Err(AppointmentError::SelfBooking);
        }

        let appointment = TherapistAppointment {
            id: Uuid::new_v4(),
            client: client_name,
            client_id: client.id,
            professional: professional_name,
            professional_id: professional.id,
            information,
            start_time,
            end_time,
            status: AppointmentStatus::Pending,
            complete: false,
            created_at: now,
        };

        let record = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to serialize appointment: {}", e)))?;
        self.store
            .insert_one(Collection::TherapistAppointments, record)
            .await
            .map_err(AppointmentError::store)?;

        info!(
            "Booked appointment {} for {} with {} at {}",
            appointment.id, appointment.client, appointment.professional, appointment.start_time
        );
        Ok(appointment)
    }

    pub async fn accept_appointment(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<TherapistAppointment>, AppointmentError> {
        self.set_status(appointment_id, AppointmentStatus::Set, now).await
    }

    pub async fn decline_appointment(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<TherapistAppointment>, AppointmentError> {
        self.set_status(appointment_id, AppointmentStatus::Declined, now).await
    }

    /// Overwrites the status without checking the current one, then returns
    /// every upcoming appointment so the caller can refresh its view.
    async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<TherapistAppointment>, AppointmentError> {
        let result = self.store
            .update_one(
                Collection::TherapistAppointments,
                &Filter::by_id(appointment_id),
                json!({ "status": status.as_str() }),
            )
            .await
            .map_err(AppointmentError::store)?;

        if result.matched_count == 0 {
            return Err(AppointmentError::NotFound);
        }
        info!("Appointment {} is now {}", appointment_id, status);

        let records = self.store
            .find(Collection::TherapistAppointments, &Filter::new())
            .await
            .map_err(AppointmentError::store)?;

        Ok(parse_appointments(records)?
            .into_iter()
            .filter(|appointment| is_upcoming(appointment, now))
            .collect())
    }

    /// Deletes an appointment on behalf of the client who booked it.
    pub async fn cancel_appointment(
        &self,
        principal_id: &str,
        appointment_id: Uuid,
    ) -> Result<TherapistAppointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        let caller = self.identity.resolve_current_user(principal_id).await?;

        if appointment.client != caller.display_name() {
            warn!("{} may not cancel appointment {}", caller.display_name(), appointment_id);
            return Err(AppointmentError::NotOwner);
        }

        let result = self.store
            .delete_one(Collection::TherapistAppointments, &Filter::by_id(appointment_id))
            .await
            .map_err(AppointmentError::store)?;

        if result.deleted_count == 0 {
            return Err(AppointmentError::NotFound);
        }

        info!("Cancelled appointment {}", appointment_id);
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<TherapistAppointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let record = self.store
            .find_one(Collection::TherapistAppointments, &Filter::by_id(appointment_id))
            .await
            .map_err(AppointmentError::store)?
            .ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(record)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Upcoming, non-complete appointments booked with the calling therapist.
    /// Scoped to the caller on purpose: other therapists' appointments are
    /// never included, even though the route takes no filter parameter.
    pub async fn list_for_therapist(
        &self,
        principal_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<TherapistAppointment>, AppointmentError> {
        let caller = self.identity.resolve_current_user(principal_id).await?;
        if caller.role != UserRole::Therapist {
            return Err(AppointmentError::NotTherapist);
        }

        let records = self.store
            .find(
                Collection::TherapistAppointments,
                &Filter::new().eq("professional", caller.display_name()),
            )
            .await
            .map_err(AppointmentError::store)?;

        Ok(parse_appointments(records)?
            .into_iter()
            .filter(|appointment| is_upcoming(appointment, now))
            .collect())
    }
}

/// Parses an `appointmentID` value, reporting a missing one as a violation.
pub fn parse_appointment_id(raw: Option<&str>) -> Result<Uuid, AppointmentError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(AppointmentError::Validation(vec!["No appointment ID provided.".to_string()]));
    }
    Uuid::parse_str(raw).map_err(|_| AppointmentError::MalformedId("appointment"))
}

fn validate_create_request(
    request: CreateTherapistAppointmentRequest,
) -> Result<(String, String, DateTime<Utc>, DateTime<Utc>), AppointmentError> {
    let mut errors = Vec::new();

    let professional = request.professional.unwrap_or_default().trim().to_string();
    let information = request.information.unwrap_or_default().trim().to_string();

    if professional.is_empty() {
        errors.push("No professional provided on request.".to_string());
    }
    if information.is_empty() {
        errors.push("No information provided on request.".to_string());
    }
    if request.start_time.is_none() {
        errors.push("No appointment start time provided on request.".to_string());
    }
    if request.end_time.is_none() {
        errors.push("No appointment end time provided on request.".to_string());
    }

    match (request.start_time, request.end_time) {
        (Some(start_time), Some(end_time)) if errors.is_empty() => {
            Ok((professional, information, start_time, end_time))
        }
        _ => Err(AppointmentError::Validation(errors)),
    }
}
