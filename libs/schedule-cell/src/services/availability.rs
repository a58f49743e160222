use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use appointment_cell::{AppointmentStatus, RehabilitatorAppointment, TherapistAppointment};
use auth_cell::{IdentityResolver, UserRole};
use shared_database::{Collection, Filter, RecordStore};

use crate::models::{ScheduleEntry, ScheduleError};

/// Calendar views over booked therapist appointments and rehabilitator
/// slots.
pub struct ScheduleService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Slots a therapist already holds, as seen by a client picking a time.
    pub async fn therapist_schedule(&self, therapist: Option<&str>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let name = required_name(therapist, "No therapist ID provided")?;

        Ok(self
            .held_appointments(name)
            .await?
            .into_iter()
            .map(|appointment| ScheduleEntry::anonymous(appointment.start_time, appointment.end_time))
            .collect())
    }

    pub async fn rehabilitator_schedule(&self, rehabilitator: Option<&str>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let name = required_name(rehabilitator, "No rehabilitator ID provided")?;

        Ok(self
            .rehab_slots(name)
            .await?
            .into_iter()
            .map(|slot| ScheduleEntry::anonymous(slot.start_time, slot.end_time))
            .collect())
    }

    pub async fn personal_therapist_schedule(&self, principal_id: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let name = self.professional_name(principal_id, UserRole::Therapist).await?;

        Ok(self
            .held_appointments(&name)
            .await?
            .into_iter()
            .map(|appointment| ScheduleEntry::personal(&name, appointment.start_time, appointment.end_time))
            .collect())
    }

    /// Rehabilitator slots carry no status, so every booked slot is listed.
    pub async fn personal_rehabilitator_schedule(&self, principal_id: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let name = self.professional_name(principal_id, UserRole::Rehabilitator).await?;

        Ok(self
            .rehab_slots(&name)
            .await?
            .into_iter()
            .map(|slot| ScheduleEntry::personal(&name, slot.start_time, slot.end_time))
            .collect())
    }

    async fn professional_name(&self, principal_id: &str, role: UserRole) -> Result<String, ScheduleError> {
        let user = self.identity.resolve_current_user(principal_id).await?;
        if user.role != role {
            return Err(ScheduleError::Forbidden);
        }
        Ok(user.display_name())
    }

    async fn held_appointments(&self, professional: &str) -> Result<Vec<TherapistAppointment>, ScheduleError> {
        let holding = AppointmentStatus::holding_slot();
        let filter = Filter::new()
            .eq("professional", professional)
            .is_in("status", holding.iter().map(|status| status.as_str()));

        self.load(Collection::TherapistAppointments, &filter).await
    }

    async fn rehab_slots(&self, professional: &str) -> Result<Vec<RehabilitatorAppointment>, ScheduleError> {
        self.load(Collection::RehabilitatorAppointments, &Filter::new().eq("professional", professional))
            .await
    }

    async fn load<T: DeserializeOwned>(&self, collection: Collection, filter: &Filter) -> Result<Vec<T>, ScheduleError> {
        debug!("Loading schedule rows from {}", collection);

        let records = self.store
            .find(collection, filter)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        records
            .into_iter()
            .map(|record| {
                serde_json::from_value(record)
                    .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse {} row: {}", collection, e)))
            })
            .collect()
    }
}

fn required_name<'a>(raw: Option<&'a str>, missing: &str) -> Result<&'a str, ScheduleError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ScheduleError::Validation(vec![missing.to_string()])),
    }
}
