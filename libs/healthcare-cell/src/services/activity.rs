use std::sync::Arc;

use tracing::debug;

use appointment_cell::TherapistAppointment;
use auth_cell::IdentityResolver;
use shared_database::{Collection, Filter, RecordStore};

use crate::models::{ActivityItem, HealthcareError};
use crate::services::case::parse_cases;

/// Builds a client's feed of open appointments and healthcare cases.
pub struct ActivityService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
}

impl ActivityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Appointments come first, followed by cases.
    pub async fn personal_activity(&self, principal_id: &str) -> Result<Vec<ActivityItem>, HealthcareError> {
        let caller = self.identity.resolve_current_user(principal_id).await?;
        let name = caller.display_name();
        debug!("Collecting activity for {}", name);

        let appointments = self.store
            .find(
                Collection::TherapistAppointments,
                &Filter::new().eq("client", name.as_str()).eq("complete", false),
            )
            .await
            .map_err(HealthcareError::store)?;

        let cases = self.store
            .find(Collection::Healthcares, &Filter::new().eq("client", name.as_str()))
            .await
            .map_err(HealthcareError::store)?;

        let mut activity = appointments
            .into_iter()
            .map(|record| {
                serde_json::from_value::<TherapistAppointment>(record)
                    .map(ActivityItem::Appointment)
                    .map_err(|e| HealthcareError::DatabaseError(format!("Failed to parse appointment: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        activity.extend(parse_cases(cases)?.into_iter().map(ActivityItem::Healthcare));
        Ok(activity)
    }
}
