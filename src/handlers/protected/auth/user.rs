// handlers/protected/auth/user.rs - PUT /api/auth/:user_id handler

use axum::extract::{Extension, Path, State};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::auth::{password::hash_password, Action, ResourceContext};
use crate::database::models::{User, UserUpdate};
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::handlers::require;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// PUT /api/auth/:user_id - Change a user's name, email or password
///
/// Callers may update themselves; admins may update anyone. Existing tokens keep the old claims.
pub async fn user_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    require(&auth, Action::UpdateUser, ResourceContext::user(user_id))?;

    let blank = |value: &Option<String>| value.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&payload.name) || blank(&payload.email) || blank(&payload.password) {
        return Err(ApiError::bad_request("name, email and password cannot be blank"));
    }

    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(hash_password(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };

    let user = state
        .db
        .update_user(
            user_id,
            UserUpdate {
                name: payload.name.map(|name| name.trim().to_string()),
                email: payload.email.map(|email| email.trim().to_string()),
                password_hash,
            },
        )
        .await?;

    info!("User {} updated by {}", user.id, auth.identity.user_id);
    Ok(ApiResponse::success(user))
}
