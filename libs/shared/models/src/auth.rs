use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// The authenticated identity behind a request. Only `id` is meaningful to
/// the workflows; everything else about a person lives in the users
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}
