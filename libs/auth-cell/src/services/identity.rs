use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use shared_database::{Collection, Filter, RecordStore};

use crate::models::{IdentityError, User, UserRole};

/// Resolves principals and display names to user records.
pub struct IdentityResolver {
    store: Arc<dyn RecordStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Looks up the user behind an authenticated principal. A missing user is
    /// fatal to the request; there is no fallback identity.
    pub async fn resolve_current_user(&self, principal_id: &str) -> Result<User, IdentityError> {
        debug!("Resolving user for principal {}", principal_id);

        let record = self.store
            .find_one(Collection::Users, &Filter::by_id(principal_id))
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?
            .ok_or(IdentityError::NotFound)?;

        parse_user(record)
    }

    /// Finds a user by "forename surname". The name is split on its first
    /// space; everything after it is the surname.
    pub async fn resolve_professional_by_full_name(
        &self,
        full_name: &str,
        expected_role: Option<UserRole>,
    ) -> Result<User, IdentityError> {
        let (forename, surname) = split_full_name(full_name);
        debug!("Resolving professional '{}' '{}'", forename, surname);

        let filter = Filter::new()
            .eq("forename", forename)
            .eq("surname", surname);

        let record = self.store
            .find_one(Collection::Users, &filter)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?
            .ok_or(IdentityError::ProfessionalNotFound)?;

        let professional = parse_user(record)?;

        if let Some(expected) = expected_role {
            if professional.role != expected {
                warn!("User '{}' is a {}, expected {}", full_name, professional.role, expected);
                return Err(IdentityError::WrongRole { expected });
            }
        }

        Ok(professional)
    }
}

pub fn split_full_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(' ') {
        Some((forename, surname)) => (forename, surname.trim()),
        None => (trimmed, ""),
    }
}

fn parse_user(record: Value) -> Result<User, IdentityError> {
    serde_json::from_value(record)
        .map_err(|e| IdentityError::DatabaseError(format!("Failed to parse user: {}", e)))
}
