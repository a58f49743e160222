use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use shared_database::{Collection, Filter, RecordStore};

use crate::models::{AppointmentError, AppointmentStatus, TherapistAppointment};
use crate::services::lifecycle::is_in_past;

/// Answers whether a therapist slot or a client is already spoken for.
pub struct SlotAvailabilityChecker {
    store: Arc<dyn RecordStore>,
}

impl SlotAvailabilityChecker {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// True when a Set or Pending appointment of `professional` starts at
    /// exactly `start_time`. Overlapping windows with different starts are
    /// not detected.
    pub async fn has_conflict(
        &self,
        professional: &str,
        start_time: DateTime<Utc>,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking slot {} for {}", start_time, professional);

        let holding = AppointmentStatus::holding_slot();
        let filter = Filter::new()
            .eq("professional", professional)
            .eq("start_time", time_value(start_time)?)
            .is_in("status", holding.iter().map(|status| status.as_str()));

        let existing = self.store
            .find_one(Collection::TherapistAppointments, &filter)
            .await
            .map_err(AppointmentError::store)?;

        if existing.is_some() {
            warn!("Slot {} for {} is already held", start_time, professional);
        }
        Ok(existing.is_some())
    }

    /// True when the client has a non-complete, non-declined appointment that
    /// starts tomorrow or later.
    pub async fn has_existing_active_booking(
        &self,
        client: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppointmentError> {
        let filter = Filter::new()
            .eq("client", client)
            .eq("complete", false);

        let records = self.store
            .find(Collection::TherapistAppointments, &filter)
            .await
            .map_err(AppointmentError::store)?;

        let appointments = parse_appointments(records)?;
        Ok(appointments.iter().any(|appointment| {
            !appointment.complete
                && appointment.status != AppointmentStatus::Declined
                && !is_in_past(appointment.start_time, now)
        }))
    }
}

/// Timestamps are compared in their serialized form, the same form they are
/// stored in.
pub(crate) fn time_value(time: DateTime<Utc>) -> Result<Value, AppointmentError> {
    serde_json::to_value(time)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to encode timestamp: {}", e)))
}

pub(crate) fn parse_appointments(records: Vec<Value>) -> Result<Vec<TherapistAppointment>, AppointmentError> {
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value(record).map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use shared_database::InMemoryStore;

    fn appointment(client: &str, start: &str, status: &str, complete: bool) -> Value {
        json!({
            "id": uuid::Uuid::new_v4(),
            "client": client,
            "client_id": "c1",
            "professional": "John Smith",
            "professional_id": "t1",
            "information": "Back pain",
            "start_time": start,
            "end_time": start,
            "status": status,
            "complete": complete,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_conflict_is_exact_start_point_check() {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(
                Collection::TherapistAppointments,
                vec![
                    appointment("Jane Doe", "2025-01-10T10:00:00Z", "Pending", false),
                    appointment("Ann Lee", "2025-01-11T10:00:00Z", "Declined", false),
                ],
            )
            .await;
        let checker = SlotAvailabilityChecker::new(store);

        let at = |d, h, m| Utc.with_ymd_and_hms(2025, 1, d, h, m, 0).unwrap();
        assert!(checker.has_conflict("John Smith", at(10, 10, 0)).await.unwrap());
        assert!(!checker.has_conflict("John Smith", at(10, 10, 30)).await.unwrap());
        assert!(!checker.has_conflict("Other Person", at(10, 10, 0)).await.unwrap());
        assert!(!checker.has_conflict("John Smith", at(11, 10, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_active_booking_ignores_past_declined_and_complete() {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(
                Collection::TherapistAppointments,
                vec![
                    appointment("Jane Doe", "2025-01-05T10:00:00Z", "Set", false),
                    appointment("Jane Doe", "2025-01-20T10:00:00Z", "Declined", false),
                    appointment("Jane Doe", "2025-01-21T10:00:00Z", "Set", true),
                    appointment("Jane Doe", "2025-01-10T16:00:00Z", "Pending", false),
                ],
            )
            .await;
        let checker = SlotAvailabilityChecker::new(store);
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();

        assert!(!checker.has_existing_active_booking("Jane Doe", now).await.unwrap());

        let tomorrow = Utc.with_ymd_and_hms(2025, 1, 9, 9, 0, 0).unwrap();
        assert!(checker.has_existing_active_booking("Jane Doe", tomorrow).await.unwrap());
    }
}
