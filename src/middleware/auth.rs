use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::auth::{AuthError, Identity};
use crate::error::ApiError;

/// Authenticated caller extracted from a bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub identity: Identity,
    /// Raw bearer token, kept so logout can revoke exactly this session.
    pub token: String,
}

/// Validates the bearer token against the token authority and injects [`AuthUser`].
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let identity = state.tokens.validate(&token).await.map_err(|err| {
        match &err {
            AuthError::Revoked => debug!("Rejected revoked or expired token"),
            AuthError::Malformed(reason) => debug!("Rejected malformed token: {}", reason),
            _ => {}
        }
        ApiError::from(err)
    })?;

    request.extensions_mut().insert(AuthUser { identity, token });

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
pub(crate) fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
