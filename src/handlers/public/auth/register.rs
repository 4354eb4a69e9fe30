// handlers/public/auth/register.rs - POST /api/auth handler

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::auth::{password::hash_password, IssuedToken};
use crate::database::models::{NewUser, RoleGrant};
use crate::database::UserRepository;
use crate::handlers::required_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth - Register a diner and log them in
///
/// 400 when name, email or password is missing, 409 when the email is taken.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<IssuedToken> {
    required_fields(&[
        ("name", payload.name.as_deref()),
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ])?;
    let password = payload.password.unwrap_or_default();

    let password_hash = hash_password(&password, state.config.security.bcrypt_cost).await?;
    let user = state
        .db
        .add_user(NewUser {
            name: payload.name.unwrap_or_default().trim().to_string(),
            email: payload.email.unwrap_or_default().trim().to_string(),
            password_hash,
            roles: vec![RoleGrant::diner()],
        })
        .await?;

    let issued = state.tokens.mint(user).await?;
    state.metrics.record_auth_attempt(true);
    state.metrics.adjust_active_users(1);

    info!("Registered user {}", issued.user.id);
    Ok(ApiResponse::success(issued))
}
