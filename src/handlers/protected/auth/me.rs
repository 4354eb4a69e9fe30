// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::extract::Extension;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - The identity carried by the caller's token
pub async fn me_get(Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let identity = auth.identity;
    Ok(ApiResponse::success(User {
        id: identity.user_id,
        name: identity.name,
        email: identity.email,
        roles: identity.roles,
    }))
}
