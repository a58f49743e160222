use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{JwtClaims, Principal};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid claims format")]
    BadClaims,

    #[error("Token expired")]
    Expired,

    #[error("Token has no subject")]
    NoSubject,
}

/// Verifies an HS256 token issued by the identity provider and returns the
/// principal it names.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Principal, TokenError> {
    validate_token_at(token, jwt_secret, Utc::now())
}

pub fn validate_token_at(
    token: &str,
    jwt_secret: &str,
    now: DateTime<Utc>,
) -> Result<Principal, TokenError> {
    if jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let mut segments = token.split('.');
    let (header, claims, signature) = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err(TokenError::Malformed),
    };

    verify_signature(header, claims, signature, jwt_secret)?;
    let claims = decode_claims(claims)?;

    if let Some(exp) = claims.exp {
        if (exp as i64) < now.timestamp() {
            debug!("Token expired at {} (now: {})", exp, now.timestamp());
            return Err(TokenError::Expired);
        }
    }

    if claims.sub.is_empty() {
        return Err(TokenError::NoSubject);
    }

    let principal = Principal {
        issued_at: claims.iat.and_then(|iat| Utc.timestamp_opt(iat as i64, 0).single()),
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    };

    debug!("Token validated for principal: {}", principal.id);
    Ok(principal)
}

fn verify_signature(header: &str, claims: &str, signature: &str, secret: &str) -> Result<(), TokenError> {
    let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::Malformed
    })?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::MissingSecret)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(claims.as_bytes());

    mac.verify_slice(&signature).map_err(|_| {
        debug!("Token signature verification failed");
        TokenError::BadSignature
    })
}

fn decode_claims(segment: &str) -> Result<JwtClaims, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| TokenError::BadClaims)?;

    serde_json::from_slice(&bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::BadClaims
    })
}
