// handlers/protected/auth/logout.rs - DELETE /api/auth handler

use axum::extract::{Extension, State};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /api/auth - Revoke the presented token
pub async fn logout_delete(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    state.tokens.revoke(&auth.token).await?;
    state.metrics.adjust_active_users(-1);

    info!("User {} logged out", auth.identity.user_id);
    Ok(ApiResponse::success(json!({ "message": "logout successful" })))
}
