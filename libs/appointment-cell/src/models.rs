use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::IdentityError;
use shared_models::error::AppError;

// ==============================================================================
// THERAPIST APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Set,
    Declined,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Set => "Set",
            AppointmentStatus::Declined => "Declined",
        }
    }

    /// Statuses that hold a professional's slot.
    pub fn holding_slot() -> [AppointmentStatus; 2] {
        [AppointmentStatus::Set, AppointmentStatus::Pending]
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client's single session with a therapist. `client` and `professional`
/// hold display names; the `_id` fields keep the owning user ids alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapistAppointment {
    pub id: Uuid,
    pub client: String,
    #[serde(default)]
    pub client_id: String,
    pub professional: String,
    #[serde(default)]
    pub professional_id: String,
    pub information: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTherapistAppointmentRequest {
    #[serde(default)]
    pub professional: Option<String>,
    #[serde(default)]
    pub information: Option<String>,
    #[serde(default, rename = "StartTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "EndTime")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Carries `appointmentID`, either as a query string or a JSON body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentIdParams {
    #[serde(default, rename = "appointmentID")]
    pub appointment_id: Option<String>,
}

// ==============================================================================
// REHABILITATOR SLOTS
// ==============================================================================

/// Correlation id supplied by the calendar widget. It sends numbers for
/// freshly drawn slots and strings for ones it has seen before.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RehabilitatorAppointment {
    pub id: Uuid,
    pub professional: String,
    #[serde(default)]
    pub professional_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_block: bool,
    pub external_id: ExternalId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RehabSlotItem {
    #[serde(default, rename = "StartTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "EndTime")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "IsBlock")]
    pub is_block: Option<bool>,
    #[serde(default, rename = "Id")]
    pub external_id: Option<ExternalId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRehabilitatorAppointmentsRequest {
    #[serde(default)]
    pub professional: Option<String>,
    #[serde(default, rename = "healthcareID")]
    pub healthcare_id: Option<String>,
    #[serde(default)]
    pub items: Vec<RehabSlotItem>,
}

/// The part of a healthcare case the batch booking needs to read.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseBookingView {
    pub id: Uuid,
    pub appointments_rehab_required: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RehabBookingOutcome {
    Booked(Vec<RehabilitatorAppointment>),
    CountMismatch { submitted: usize, required: u32 },
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Invalid input")]
    Validation(Vec<String>),

    #[error("Invalid {0} ID.")]
    MalformedId(&'static str),

    #[error("The appointment has been cancelled or doesn't exist.")]
    NotFound,

    #[error("Healthcare case not found.")]
    CaseNotFound,

    #[error("You already have a booked appointment with a therapist. Please attend the current appointment before booking another.")]
    ActiveBookingExists,

    #[error("The chosen date and time is already taken, please refresh the page to update available slots or choose another date.")]
    SlotTaken,

    #[error("A professional cannot book an appointment for themselves.")]
    SelfBooking,

    #[error("Someone already booked one or more of the desired slots.")]
    SlotsTaken,

    #[error("The user has no access to this appointment")]
    NotOwner,

    #[error("Access Denied")]
    NotTherapist,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::Validation(errors) => AppError::invalid_input(errors),
            AppointmentError::MalformedId(_)
            | AppointmentError::ActiveBookingExists
            | AppointmentError::SlotTaken
            | AppointmentError::SelfBooking => AppError::validation(error.to_string()),
            AppointmentError::NotFound | AppointmentError::CaseNotFound => {
                AppError::NotFound(error.to_string())
            }
            AppointmentError::NotOwner | AppointmentError::NotTherapist => {
                AppError::Forbidden(error.to_string())
            }
            AppointmentError::SlotsTaken => AppError::Conflict(error.to_string()),
            AppointmentError::Identity(inner) => inner.into(),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

impl AppointmentError {
    pub(crate) fn store(error: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_rehab_item_accepts_numeric_and_text_ids() {
        let items: Vec<RehabSlotItem> = serde_json::from_value(json!([
            {"StartTime": "2025-01-10T10:00:00Z", "EndTime": "2025-01-10T11:00:00Z", "IsBlock": true, "Id": 3},
            {"StartTime": "2025-01-11T10:00:00Z", "EndTime": "2025-01-11T11:00:00Z", "IsBlock": false, "Id": "slot-4"}
        ]))
        .unwrap();

        assert_eq!(items[0].external_id, Some(ExternalId::Number(3)));
        assert_eq!(items[1].external_id, Some(ExternalId::Text("slot-4".to_string())));
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (AppointmentError::Validation(vec!["x".into()]), StatusCode::UNPROCESSABLE_ENTITY),
            (AppointmentError::SlotTaken, StatusCode::UNPROCESSABLE_ENTITY),
            (AppointmentError::NotFound, StatusCode::NOT_FOUND),
            (AppointmentError::NotOwner, StatusCode::FORBIDDEN),
            (AppointmentError::SlotsTaken, StatusCode::FAILED_DEPENDENCY),
            (AppointmentError::Identity(IdentityError::NotFound), StatusCode::NOT_FOUND),
            (AppointmentError::DatabaseError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(AppointmentStatus::Set).unwrap(), json!("Set"));
        assert_eq!(AppointmentStatus::Declined.to_string(), "Declined");
    }
}
