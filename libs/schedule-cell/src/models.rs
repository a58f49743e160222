use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::IdentityError;
use shared_models::error::AppError;

/// One calendar block as the booking widget expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleEntry {
    #[serde(rename = "Id")]
    pub id: Uuid,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "IsBlock")]
    pub is_block: bool,
    #[serde(rename = "StartTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "EndTime")]
    pub end_time: DateTime<Utc>,
}

impl ScheduleEntry {
    /// A slot shown to other people: occupied, but without details.
    pub fn anonymous(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: String::new(),
            is_block: true,
            start_time,
            end_time,
        }
    }

    pub fn personal(owner: &str, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: owner.to_string(),
            is_block: false,
            start_time,
            end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TherapistScheduleQuery {
    #[serde(default, rename = "therapistID")]
    pub therapist_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RehabilitatorScheduleQuery {
    #[serde(default, rename = "rehabilitatorID")]
    pub rehabilitator_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid input")]
    Validation(Vec<String>),

    #[error("User has no access to the requested data.")]
    Forbidden,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ScheduleError> for AppError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::Validation(errors) => AppError::invalid_input(errors),
            ScheduleError::Forbidden => AppError::Forbidden(error.to_string()),
            ScheduleError::Identity(inner) => inner.into(),
            ScheduleError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
