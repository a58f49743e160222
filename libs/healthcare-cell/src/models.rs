use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::{RehabilitatorAppointment, TherapistAppointment};
use auth_cell::IdentityError;
use shared_models::error::AppError;

pub const MAX_REHAB_SESSIONS: i64 = 10;
pub const MAX_CASE_DOCUMENTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDocument {
    pub name: String,
    #[serde(default)]
    pub information: String,
}

/// A client's course of treatment, opened by a therapist from one of their
/// appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthcareCase {
    pub id: Uuid,
    pub client: String,
    pub therapist: String,
    #[serde(default)]
    pub rehabilitator: String,
    pub information: String,
    pub diagnosis: String,
    pub appointments_rehab_required: u32,
    #[serde(default)]
    pub appointments_rehabilitator: Vec<RehabilitatorAppointment>,
    pub appointment_therapist: Uuid,
    #[serde(default)]
    pub documents: Vec<CaseDocument>,
    #[serde(default)]
    pub client_docs: Vec<CaseDocument>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub therapist_requirement: bool,
    pub complete: bool,
    pub initialised_at: DateTime<Utc>,
}

/// A case together with the appointment it was opened from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthcareCaseDetail {
    #[serde(flatten)]
    pub case: HealthcareCase,
    pub appointment: TherapistAppointment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateHealthcareRequest {
    #[serde(default)]
    pub appointment: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default, rename = "appointmentsRehabRequired")]
    pub appointments_rehab_required: Option<i64>,
    #[serde(default)]
    pub documents: Vec<CaseDocument>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthcareIdParams {
    #[serde(default, rename = "healthcareID")]
    pub healthcare_id: Option<String>,
}

/// File metadata a client attaches to their case after uploading the files
/// elsewhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientDocumentsRequest {
    #[serde(default, rename = "healthcareID")]
    pub healthcare_id: Option<String>,
    #[serde(default, rename = "fileDocs")]
    pub file_docs: Vec<CaseDocument>,
}

/// Which parts of a case a professional is extending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseUpdateMode {
    Requirements,
    Documents,
    Mixed,
}

impl CaseUpdateMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "requirements" => Some(CaseUpdateMode::Requirements),
            "documents" => Some(CaseUpdateMode::Documents),
            "mixed" => Some(CaseUpdateMode::Mixed),
            _ => None,
        }
    }

    pub fn touches_documents(self) -> bool {
        matches!(self, CaseUpdateMode::Documents | CaseUpdateMode::Mixed)
    }

    pub fn touches_requirements(self) -> bool {
        matches!(self, CaseUpdateMode::Requirements | CaseUpdateMode::Mixed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseUpdateRequest {
    #[serde(default, rename = "healthcareID")]
    pub healthcare_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, rename = "fileDocs")]
    pub file_docs: Vec<CaseDocument>,
}

/// One entry of a client's activity feed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityItem {
    Appointment(TherapistAppointment),
    Healthcare(HealthcareCase),
}

#[derive(Debug, Error)]
pub enum HealthcareError {
    #[error("Invalid input")]
    Validation(Vec<String>),

    #[error("Invalid healthcare ID.")]
    MalformedId,

    #[error("Healthcare not found")]
    NotFound,

    #[error("No appointment found as the provided in the request. Please refresh and try again.")]
    AppointmentNotFound,

    #[error("Only therapists can open a healthcare case.")]
    NotTherapist,

    #[error("No access to the requested resources.")]
    NoAccess,

    #[error("Nothing has been changed, {0} was unsuccessful")]
    Unchanged(&'static str),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl HealthcareError {
    pub(crate) fn store(error: anyhow::Error) -> Self {
        HealthcareError::DatabaseError(error.to_string())
    }
}

impl From<HealthcareError> for AppError {
    fn from(error: HealthcareError) -> Self {
        match error {
            HealthcareError::Validation(errors) => AppError::invalid_input(errors),
            HealthcareError::MalformedId => AppError::validation(error.to_string()),
            HealthcareError::NotFound | HealthcareError::AppointmentNotFound => {
                AppError::NotFound(error.to_string())
            }
            HealthcareError::NotTherapist | HealthcareError::NoAccess => {
                AppError::Forbidden(error.to_string())
            }
            HealthcareError::Unchanged(_) => AppError::BadRequest(error.to_string()),
            HealthcareError::Identity(inner) => inner.into(),
            HealthcareError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
