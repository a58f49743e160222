use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, RecordStoreKind};
use shared_database::InMemoryStore;

use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub serialize_slot_bookings: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            serialize_slot_bookings: false,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            server_port: 3000,
            record_store: RecordStoreKind::Memory,
            serialize_slot_bookings: self.serialize_slot_bookings,
            cors_allowed_origin: None,
        }
    }

    /// Application state backed by the given in-memory store, so tests can
    /// seed and inspect records around requests.
    pub fn to_state(&self, store: Arc<InMemoryStore>) -> AppState {
        AppState::new(self.to_app_config(), store)
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub forename: String,
    pub surname: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            forename: "Test".to_string(),
            surname: "User".to_string(),
            role: "Client".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            email: email.to_string(),
            role: role.to_string(),
            ..Self::default()
        }
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "Client")
    }

    pub fn therapist(email: &str) -> Self {
        Self::new(email, "Therapist")
    }

    pub fn rehabilitator(email: &str) -> Self {
        Self::new(email, "Rehabilitator")
    }

    pub fn named(mut self, forename: &str, surname: &str) -> Self {
        self.forename = forename.to_string();
        self.surname = surname.to_string();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.forename, self.surname)
    }

    /// The users-collection document for this person.
    pub fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "forename": self.forename,
            "surname": self.surname,
            "avatar": "",
            "role": self.role,
        })
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.record_store, RecordStoreKind::Memory);
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_record_shape() {
        let user = TestUser::therapist("doc@example.com").named("John", "Smith");
        let record = user.to_record();

        assert_eq!(user.full_name(), "John Smith");
        assert_eq!(record["role"], "Therapist");
        assert_eq!(record["id"], user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
