use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::IdentityResolver;
use shared_database::{Collection, Filter, RecordStore};
use shared_utils::locks::{guard_for, SlotLocks};

use crate::models::{
    AppointmentError, CaseBookingView, CreateRehabilitatorAppointmentsRequest, ExternalId,
    RehabBookingOutcome, RehabilitatorAppointment,
};

const MAX_SLOTS_PER_REQUEST: usize = 6;

#[derive(Debug)]
struct RequestedSlot {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_block: bool,
    external_id: ExternalId,
}

#[derive(Debug)]
struct ValidatedBatch {
    professional: String,
    healthcare_id: String,
    slots: Vec<RequestedSlot>,
}

/// Books the full set of rehabilitator sessions a healthcare case asks for.
pub struct RehabBookingService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
    slot_locks: Option<Arc<SlotLocks>>,
}

impl RehabBookingService {
    pub fn new(store: Arc<dyn RecordStore>, slot_locks: Option<Arc<SlotLocks>>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            store,
            slot_locks,
        }
    }

    /// Nothing is written unless every requested start time is free. Once the
    /// slot insert succeeds, a failed case update is reported but not undone.
    pub async fn book_slots(
        &self,
        request: CreateRehabilitatorAppointmentsRequest,
    ) -> Result<RehabBookingOutcome, AppointmentError> {
        let batch = validate_batch(request)?;

        let professional = self.identity
            .resolve_professional_by_full_name(&batch.professional, None)
            .await?;
        let professional_name = professional.display_name();

        let case_id = Uuid::parse_str(&batch.healthcare_id)
            .map_err(|_| AppointmentError::MalformedId("healthcare"))?;
        let case = self.load_case(case_id).await?;

        let required = case.appointments_rehab_required;
        if batch.slots.len() != required as usize {
            warn!(
                "Case {} needs {} rehabilitator sessions, {} submitted",
                case.id, required, batch.slots.len()
            );
            return Ok(RehabBookingOutcome::CountMismatch {
                submitted: batch.slots.len(),
                required,
            });
        }

        let _guard = guard_for(self.slot_locks.as_ref(), &professional_name).await;

        let booked = self.booked_slots(&professional_name).await?;
        let taken: Vec<DateTime<Utc>> = batch
            .slots
            .iter()
            .map(|slot| slot.start_time)
            .filter(|start| booked.iter().any(|existing| existing.start_time == *start))
            .collect();

        if !taken.is_empty() {
            warn!("{} already has bookings at {:?}", professional_name, taken);
            return Err(AppointmentError::SlotsTaken);
        }

        let slots: Vec<RehabilitatorAppointment> = batch
            .slots
            .into_iter()
            .map(|slot| RehabilitatorAppointment {
                id: Uuid::new_v4(),
                professional: professional_name.clone(),
                professional_id: professional.id.clone(),
                start_time: slot.start_time,
                end_time: slot.end_time,
                is_block: slot.is_block,
                external_id: slot.external_id,
            })
            .collect();

        let records = slots
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to serialize slots: {}", e)))?;

        self.store
            .insert_many(Collection::RehabilitatorAppointments, records.clone())
            .await
            .map_err(AppointmentError::store)?;

        let linked = self.store
            .update_one(
                Collection::Healthcares,
                &Filter::by_id(case.id),
                json!({
                    "appointments_rehabilitator": records,
                    "rehabilitator": professional_name,
                }),
            )
            .await
            .map_err(AppointmentError::store)?;

        // The slots are already written; a vanished case only leaves them unlinked.
        if linked.matched_count == 0 {
            warn!(
                "Healthcare case {} disappeared before {} booked sessions could be linked",
                case.id, slots.len()
            );
        }

        info!("Booked {} rehabilitator sessions with {} for case {}", slots.len(), professional_name, case.id);
        Ok(RehabBookingOutcome::Booked(slots))
    }

    async fn load_case(&self, case_id: Uuid) -> Result<CaseBookingView, AppointmentError> {
        let record = self.store
            .find_one(Collection::Healthcares, &Filter::by_id(case_id))
            .await
            .map_err(AppointmentError::store)?
            .ok_or(AppointmentError::CaseNotFound)?;

        serde_json::from_value(record)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse healthcare case: {}", e)))
    }

    async fn booked_slots(&self, professional: &str) -> Result<Vec<RehabilitatorAppointment>, AppointmentError> {
        debug!("Loading booked rehabilitator slots for {}", professional);

        let records = self.store
            .find(
                Collection::RehabilitatorAppointments,
                &Filter::new().eq("professional", professional),
            )
            .await
            .map_err(AppointmentError::store)?;

        records
            .into_iter()
            .map(|record| {
                serde_json::from_value(record).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse rehabilitator slot: {}", e))
                })
            })
            .collect()
    }
}

fn validate_batch(request: CreateRehabilitatorAppointmentsRequest) -> Result<ValidatedBatch, AppointmentError> {
    let mut errors = Vec::new();

    let professional = request.professional.unwrap_or_default().trim().to_string();
    let healthcare_id = request.healthcare_id.unwrap_or_default().trim().to_string();

    if professional.is_empty() {
        errors.push("No professional provided on request.".to_string());
    }
    if healthcare_id.is_empty() {
        errors.push("No healthcare ID provided on request.".to_string());
    }
    if request.items.is_empty() {
        errors.push("No rehabilitator appointments provided on request.".to_string());
    }
    if request.items.len() > MAX_SLOTS_PER_REQUEST {
        errors.push("The request Object has more attributes than expected".to_string());
    }

    let mut slots = Vec::with_capacity(request.items.len());
    for (index, item) in request.items.into_iter().enumerate() {
        let position = index + 1;
        if item.start_time.is_none() {
            errors.push(format!("No property of StartTime on appointment {}", position));
        }
        if item.end_time.is_none() {
            errors.push(format!("No property of EndTime on appointment {}", position));
        }
        if item.is_block.is_none() {
            errors.push(format!("No property of IsBlock on appointment {}", position));
        }
        if item.external_id.is_none() {
            errors.push(format!("No property of Id on appointment {}", position));
        }

        if let (Some(start_time), Some(end_time), Some(is_block), Some(external_id)) =
            (item.start_time, item.end_time, item.is_block, item.external_id)
        {
            slots.push(RequestedSlot { start_time, end_time, is_block, external_id });
        }
    }

    if !errors.is_empty() {
        return Err(AppointmentError::Validation(errors));
    }

    Ok(ValidatedBatch { professional, healthcare_id, slots })
}
