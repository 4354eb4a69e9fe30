// handlers/protected/franchise/delete.rs - DELETE /api/franchise/:franchise_id handler

use axum::extract::{Extension, Path, State};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::FranchiseRepository;
use crate::handlers::require;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /api/franchise/:franchise_id - Remove a franchise with its stores and franchisee grants
pub async fn franchise_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(franchise_id): Path<i64>,
) -> ApiResult<Value> {
    require(&auth, Action::DeleteFranchise, ResourceContext::franchise(franchise_id))?;

    state.db.delete_franchise(franchise_id).await?;

    info!("Franchise {} deleted by {}", franchise_id, auth.identity.user_id);
    Ok(ApiResponse::success(json!({ "message": "franchise deleted" })))
}
