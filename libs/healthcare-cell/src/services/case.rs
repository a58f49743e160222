use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::TherapistAppointment;
use auth_cell::{IdentityResolver, User, UserRole};
use shared_database::{Collection, Condition, Filter, RecordStore, UpdateResult};

use crate::models::{
    CaseUpdateMode, CaseUpdateRequest, ClientDocumentsRequest, CreateHealthcareRequest,
    HealthcareCase, HealthcareCaseDetail, HealthcareError, MAX_CASE_DOCUMENTS, MAX_REHAB_SESSIONS,
};

pub struct HealthcareService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
}

impl HealthcareService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Opens a case from a therapist appointment. The appointment is marked
    /// complete before the case is written.
    pub async fn create_case(
        &self,
        principal_id: &str,
        request: CreateHealthcareRequest,
        now: DateTime<Utc>,
    ) -> Result<HealthcareCase, HealthcareError> {
        let errors = validate_create_request(&request);
        if !errors.is_empty() {
            return Err(HealthcareError::Validation(errors));
        }

        let caller = self.identity.resolve_current_user(principal_id).await?;
        if caller.role != UserRole::Therapist {
            return Err(HealthcareError::NotTherapist);
        }

        let appointment_id = request
            .appointment
            .as_deref()
            .map(str::trim)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(HealthcareError::AppointmentNotFound)?;
        let appointment = self.load_appointment(appointment_id).await?;

        self.store
            .update_one(
                Collection::TherapistAppointments,
                &Filter::by_id(appointment.id),
                json!({ "complete": true }),
            )
            .await
            .map_err(HealthcareError::store)?;

        let case = HealthcareCase {
            id: Uuid::new_v4(),
            client: appointment.client,
            therapist: appointment.professional,
            rehabilitator: String::new(),
            information: appointment.information,
            diagnosis: request.diagnosis.unwrap_or_default().trim().to_string(),
            appointments_rehab_required: request
                .appointments_rehab_required
                .and_then(|count| u32::try_from(count).ok())
                .unwrap_or_default(),
            appointments_rehabilitator: Vec::new(),
            appointment_therapist: appointment.id,
            documents: request.documents,
            client_docs: Vec::new(),
            requirements: request.requirements,
            therapist_requirement: false,
            complete: false,
            initialised_at: now,
        };

        let record = serde_json::to_value(&case)
            .map_err(|e| HealthcareError::DatabaseError(format!("Failed to serialize case: {}", e)))?;
        self.store
            .insert_one(Collection::Healthcares, record)
            .await
            .map_err(HealthcareError::store)?;

        info!("Opened healthcare case {} for {} by {}", case.id, case.client, case.therapist);
        Ok(case)
    }

    pub async fn get_case(&self, case_id: Uuid) -> Result<HealthcareCaseDetail, HealthcareError> {
        let case = self.load_case(case_id).await?;
        let appointment = self
            .load_appointment(case.appointment_therapist)
            .await
            .map_err(|error| match error {
                HealthcareError::AppointmentNotFound => HealthcareError::NotFound,
                other => other,
            })?;

        Ok(HealthcareCaseDetail { case, appointment })
    }

    /// Cases the caller works on, either as therapist or as rehabilitator.
    pub async fn list_cases(&self, principal_id: &str) -> Result<Vec<HealthcareCase>, HealthcareError> {
        let caller = self.identity.resolve_current_user(principal_id).await?;
        let name = Value::String(caller.display_name());

        let filter = Filter::new().any_of(vec![
            Condition::Eq("therapist".to_string(), name.clone()),
            Condition::Eq("rehabilitator".to_string(), name),
        ]);

        let records = self.store
            .find(Collection::Healthcares, &filter)
            .await
            .map_err(HealthcareError::store)?;

        parse_cases(records)
    }

    /// Clears the flag raised when the client uploads documents.
    pub async fn confirm_changes(&self, principal_id: &str, case_id: Uuid) -> Result<UpdateResult, HealthcareError> {
        self.update_owned_case(principal_id, case_id, json!({ "therapist_requirement": false }), "confirmation")
            .await
    }

    pub async fn complete_case(&self, principal_id: &str, case_id: Uuid) -> Result<UpdateResult, HealthcareError> {
        self.update_owned_case(principal_id, case_id, json!({ "complete": true }), "completion")
            .await
    }

    /// Appends the file names a client uploaded and flags the case for the
    /// therapist's review. Outstanding requirements are cleared, since the
    /// upload answers them.
    pub async fn attach_client_documents(
        &self,
        principal_id: &str,
        request: ClientDocumentsRequest,
    ) -> Result<UpdateResult, HealthcareError> {
        let mut errors = Vec::new();
        if is_blank(request.healthcare_id.as_deref()) {
            errors.push("No healthcare ID provided on the request.".to_string());
        }
        if request.file_docs.is_empty() {
            errors.push("No file names provided on the request.".to_string());
        }
        if !errors.is_empty() {
            return Err(HealthcareError::Validation(errors));
        }

        let case_id = parse_healthcare_id(request.healthcare_id.as_deref())?;
        let caller = self.identity.resolve_current_user(principal_id).await?;
        let case = self.load_case(case_id).await?;

        if case.client != caller.display_name() {
            warn!("{} tried to attach documents to case {}", caller.display_name(), case.id);
            return Err(HealthcareError::NoAccess);
        }

        let added = request.file_docs.len();
        let mut client_docs = case.client_docs;
        client_docs.extend(request.file_docs);

        let patch = json!({
            "therapist_requirement": true,
            "client_docs": client_docs,
            "requirements": [],
        });
        let result = self.write_case(case_id, patch).await?;

        info!("{} documents attached to case {} by its client", added, case_id);
        Ok(result)
    }

    /// Lets the case's therapist or rehabilitator add documents, new
    /// requirements, or both. New requirements are listed before older ones.
    pub async fn extend_case(
        &self,
        principal_id: &str,
        request: CaseUpdateRequest,
    ) -> Result<UpdateResult, HealthcareError> {
        let mode = validate_update_request(&request)?;
        let case_id = parse_healthcare_id(request.healthcare_id.as_deref())?;

        let caller = self.identity.resolve_current_user(principal_id).await?;
        let name = caller.display_name();
        let case = self.load_case(case_id).await?;

        if case.therapist != name && case.rehabilitator != name {
            warn!("{} has no access to extend case {}", name, case.id);
            return Err(HealthcareError::NoAccess);
        }

        let mut patch = Map::new();
        if mode.touches_documents() {
            let mut documents = case.documents;
            documents.extend(request.file_docs);
            patch.insert("documents".to_string(), json!(documents));
        }
        if mode.touches_requirements() {
            let requirements: Vec<String> = request
                .requirements
                .into_iter()
                .chain(case.requirements)
                .collect();
            patch.insert("requirements".to_string(), json!(requirements));
        }

        let result = self.write_case(case_id, Value::Object(patch)).await?;

        info!("Healthcare case {} extended ({:?}) by {}", case_id, mode, name);
        Ok(result)
    }

    async fn write_case(&self, case_id: Uuid, patch: Value) -> Result<UpdateResult, HealthcareError> {
        let result = self.store
            .update_one(Collection::Healthcares, &Filter::by_id(case_id), patch)
            .await
            .map_err(HealthcareError::store)?;

        if result.matched_count == 0 {
            return Err(HealthcareError::NotFound);
        }
        Ok(result)
    }

    async fn update_owned_case(
        &self,
        principal_id: &str,
        case_id: Uuid,
        patch: Value,
        action: &'static str,
    ) -> Result<UpdateResult, HealthcareError> {
        let caller = self.identity.resolve_current_user(principal_id).await?;
        let case = self.load_case(case_id).await?;
        ensure_therapist_owner(&caller, &case)?;

        let result = self.store
            .update_one(Collection::Healthcares, &Filter::by_id(case_id), patch)
            .await
            .map_err(HealthcareError::store)?;

        if result.modified_count == 0 {
            return Err(HealthcareError::Unchanged(action));
        }

        info!("Healthcare case {} {} by {}", case_id, action, caller.display_name());
        Ok(result)
    }

    async fn load_case(&self, case_id: Uuid) -> Result<HealthcareCase, HealthcareError> {
        debug!("Loading healthcare case {}", case_id);

        let record = self.store
            .find_one(Collection::Healthcares, &Filter::by_id(case_id))
            .await
            .map_err(HealthcareError::store)?
            .ok_or(HealthcareError::NotFound)?;

        serde_json::from_value(record)
            .map_err(|e| HealthcareError::DatabaseError(format!("Failed to parse case: {}", e)))
    }

    async fn load_appointment(&self, appointment_id: Uuid) -> Result<TherapistAppointment, HealthcareError> {
        let record = self.store
            .find_one(Collection::TherapistAppointments, &Filter::by_id(appointment_id))
            .await
            .map_err(HealthcareError::store)?
            .ok_or(HealthcareError::AppointmentNotFound)?;

        serde_json::from_value(record)
            .map_err(|e| HealthcareError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }
}

pub fn parse_healthcare_id(raw: Option<&str>) -> Result<Uuid, HealthcareError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(HealthcareError::Validation(vec!["No healthcare ID provided on the request.".to_string()]));
    }
    Uuid::parse_str(raw).map_err(|_| HealthcareError::MalformedId)
}

pub(crate) fn parse_cases(records: Vec<Value>) -> Result<Vec<HealthcareCase>, HealthcareError> {
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value(record)
                .map_err(|e| HealthcareError::DatabaseError(format!("Failed to parse case: {}", e)))
        })
        .collect()
}

fn ensure_therapist_owner(caller: &User, case: &HealthcareCase) -> Result<(), HealthcareError> {
    if case.therapist != caller.display_name() {
        warn!("{} has no access to case {}", caller.display_name(), case.id);
        return Err(HealthcareError::NoAccess);
    }
    Ok(())
}

fn is_blank(raw: Option<&str>) -> bool {
    raw.map(str::trim).unwrap_or("").is_empty()
}

/// Checks run in a fixed order and stop at the first problem.
fn validate_update_request(request: &CaseUpdateRequest) -> Result<CaseUpdateMode, HealthcareError> {
    let invalid = |message: &str| HealthcareError::Validation(vec![message.to_string()]);

    let raw_mode = request.mode.as_deref().map(str::trim).unwrap_or("");
    if raw_mode.is_empty() {
        return Err(invalid("Request mode not provided"));
    }
    if is_blank(request.healthcare_id.as_deref()) {
        return Err(invalid("No healthcare ID provided."));
    }

    let mode = CaseUpdateMode::parse(raw_mode).ok_or_else(|| invalid("Unknown request mode."))?;
    match mode {
        CaseUpdateMode::Requirements if request.requirements.is_empty() => {
            Err(invalid("No requirements provided."))
        }
        CaseUpdateMode::Documents if request.file_docs.is_empty() => {
            Err(invalid("No documents provided."))
        }
        CaseUpdateMode::Mixed if request.file_docs.is_empty() || request.requirements.is_empty() => {
            Err(invalid("Either documents or requirements are missing."))
        }
        _ => Ok(mode),
    }
}

fn validate_create_request(request: &CreateHealthcareRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if request.appointment.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.push("No appointment id attached to the request.".to_string());
    }
    if request.diagnosis.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.push("No diagnosis provided on request.".to_string());
    }
    match request.appointments_rehab_required {
        Some(count) if (1..=MAX_REHAB_SESSIONS).contains(&count) => {}
        _ => errors.push("Wrong rehabilitator appointment amount provided.".to_string()),
    }
    if request.documents.len() > MAX_CASE_DOCUMENTS {
        errors.push(format!("Documents in the request exceed {}.", MAX_CASE_DOCUMENTS));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CaseDocument;

    #[test]
    fn test_create_validation() {
        let errors = validate_create_request(&CreateHealthcareRequest::default());
        assert_eq!(
            errors,
            vec![
                "No appointment id attached to the request.",
                "No diagnosis provided on request.",
                "Wrong rehabilitator appointment amount provided.",
            ]
        );

        let request = CreateHealthcareRequest {
            appointment: Some(Uuid::new_v4().to_string()),
            diagnosis: Some("Sprain".to_string()),
            appointments_rehab_required: Some(11),
            documents: (0..11)
                .map(|i| CaseDocument { name: format!("scan-{}.pdf", i), information: String::new() })
                .collect(),
            requirements: Vec::new(),
        };
        assert_eq!(
            validate_create_request(&request),
            vec![
                "Wrong rehabilitator appointment amount provided.",
                "Documents in the request exceed 10.",
            ]
        );
    }

    #[test]
    fn test_update_request_validation_order() {
        let message = |request: CaseUpdateRequest| match validate_update_request(&request) {
            Err(HealthcareError::Validation(errors)) => errors.join(""),
            other => panic!("expected validation error, got {:?}", other),
        };
        let with_id = |mode: &str| CaseUpdateRequest {
            healthcare_id: Some(Uuid::new_v4().to_string()),
            mode: Some(mode.to_string()),
            ..CaseUpdateRequest::default()
        };

        assert_eq!(message(CaseUpdateRequest::default()), "Request mode not provided");
        assert_eq!(
            message(CaseUpdateRequest { mode: Some("mixed".to_string()), ..CaseUpdateRequest::default() }),
            "No healthcare ID provided."
        );
        assert_eq!(message(with_id("everything")), "Unknown request mode.");
        assert_eq!(message(with_id("requirements")), "No requirements provided.");
        assert_eq!(message(with_id("documents")), "No documents provided.");

        let half_mixed = CaseUpdateRequest {
            requirements: vec!["Weekly log".to_string()],
            ..with_id("mixed")
        };
        assert_eq!(message(half_mixed), "Either documents or requirements are missing.");

        let requirements_only = CaseUpdateRequest {
            requirements: vec!["Weekly log".to_string()],
            ..with_id("requirements")
        };
        assert_eq!(validate_update_request(&requirements_only).unwrap(), CaseUpdateMode::Requirements);
    }

    #[test]
    fn test_parse_healthcare_id() {
        assert!(matches!(parse_healthcare_id(Some("")), Err(HealthcareError::Validation(_))));
        assert!(matches!(parse_healthcare_id(Some("xyz")), Err(HealthcareError::MalformedId)));
    }
}
