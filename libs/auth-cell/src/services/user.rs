use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use shared_database::{Collection, Filter, RecordStore};

use crate::models::{CreateUserRequest, IdentityError, User, UserRole};
use crate::services::identity::IdentityResolver;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub struct UserService {
    store: Arc<dyn RecordStore>,
    identity: IdentityResolver,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Registers the calling principal as a Client. Professionals are
    /// promoted outside this service.
    pub async fn create_user(
        &self,
        principal_id: &str,
        request: CreateUserRequest,
    ) -> Result<User, IdentityError> {
        let errors = validate_create_user(&request);
        if !errors.is_empty() {
            return Err(IdentityError::Validation(errors));
        }

        let existing = self.store
            .find_one(Collection::Users, &Filter::by_id(principal_id))
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;
        if existing.is_some() {
            return Err(IdentityError::AlreadyExists);
        }

        let user = User {
            id: principal_id.to_string(),
            email: request.email.unwrap_or_default().trim().to_string(),
            forename: request.forename.unwrap_or_default().trim().to_string(),
            surname: request.surname.unwrap_or_default().trim().to_string(),
            avatar: String::new(),
            role: UserRole::Client,
        };

        let record = serde_json::to_value(&user)
            .map_err(|e| IdentityError::DatabaseError(format!("Failed to serialize user: {}", e)))?;
        self.store
            .insert_one(Collection::Users, record)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        info!("Created user {} ({})", user.id, user.display_name());
        Ok(user)
    }

    pub async fn get_user(&self, principal_id: &str) -> Result<User, IdentityError> {
        debug!("Fetching user {}", principal_id);
        self.identity.resolve_current_user(principal_id).await
    }
}

fn validate_create_user(request: &CreateUserRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let email = request.email.as_deref().map(str::trim).unwrap_or("");

    if email.is_empty() {
        errors.push("No email provided.".to_string());
    }
    if !is_valid_email(email) {
        errors.push("Problem with email format.".to_string());
    }
    if is_blank(&request.forename) {
        errors.push("No forename provided.".to_string());
    }
    if is_blank(&request.surname) {
        errors.push("No surname provided.".to_string());
    }

    errors
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map(str::is_empty).unwrap_or(true)
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}
