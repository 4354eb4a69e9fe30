// handlers/public/auth/login.rs - PUT /api/auth handler

use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{AuthError, IssuedToken};
use crate::handlers::required_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// PUT /api/auth - Exchange credentials for a bearer token
///
/// Unknown email answers 404 and a wrong password 401; both count as failed attempts.
pub async fn login_put(State(state): State<AppState>, ApiJson(payload): ApiJson<LoginRequest>) -> ApiResult<IssuedToken> {
    required_fields(&[
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ])?;
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    match state.tokens.issue(email.trim(), &password).await {
        Ok(issued) => {
            state.metrics.record_auth_attempt(true);
            state.metrics.adjust_active_users(1);
            info!("User {} logged in", issued.user.id);
            Ok(ApiResponse::success(issued))
        }
        Err(err) => {
            if matches!(err, AuthError::NotFound | AuthError::Unauthorized) {
                state.metrics.record_auth_attempt(false);
                warn!("Failed login attempt: {}", err);
            }
            Err(err.into())
        }
    }
}
