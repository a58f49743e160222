use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Client,
    Therapist,
    Rehabilitator,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Client => write!(f, "Client"),
            UserRole::Therapist => write!(f, "Therapist"),
            UserRole::Rehabilitator => write!(f, "Rehabilitator"),
        }
    }
}

impl UserRole {
    pub fn is_professional(&self) -> bool {
        matches!(self, UserRole::Therapist | UserRole::Rehabilitator)
    }
}

/// A person known to the clinic. `id` is the identity provider's subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub forename: String,
    pub surname: String,
    #[serde(default)]
    pub avatar: String,
    pub role: UserRole,
}

impl User {
    /// "forename surname", the value appointments and cases store to refer
    /// to this user.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.forename, self.surname)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub forename: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User not found")]
    NotFound,

    #[error("Professional doesn't match with any in the database")]
    ProfessionalNotFound,

    #[error("The chosen user is not a {expected}.")]
    WrongRole { expected: UserRole },

    #[error("A user already exists for this account")]
    AlreadyExists,

    #[error("Invalid input")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<IdentityError> for AppError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::NotFound => AppError::NotFound("User not found.".to_string()),
            IdentityError::Validation(errors) => AppError::invalid_input(errors),
            IdentityError::ProfessionalNotFound
            | IdentityError::WrongRole { .. }
            | IdentityError::AlreadyExists => AppError::validation(error.to_string()),
            IdentityError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_deserializes_without_avatar() {
        let user: User = serde_json::from_value(json!({
            "id": "uid-1",
            "email": "john@example.com",
            "forename": "John",
            "surname": "Smith",
            "role": "Therapist"
        }))
        .unwrap();

        assert_eq!(user.display_name(), "John Smith");
        assert_eq!(user.role, UserRole::Therapist);
        assert!(user.avatar.is_empty());
    }

    #[test]
    fn test_wrong_role_message() {
        let error = IdentityError::WrongRole { expected: UserRole::Therapist };
        assert_eq!(error.to_string(), "The chosen user is not a Therapist.");
    }
}
