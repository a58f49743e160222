use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};

use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

/// Validates the bearer token and stores the resulting `Principal` in the
/// request extensions for handlers to pick up.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !request.headers().contains_key(AUTHORIZATION) {
        return Err(AppError::Auth("Token not provided".to_string()));
    }

    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let principal = validate_token(bearer.token(), &state.config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
