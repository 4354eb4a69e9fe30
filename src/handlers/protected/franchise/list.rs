// handlers/protected/franchise/list.rs - GET /api/franchise and GET /api/franchise/:user_id

use axum::extract::{Extension, Path, State};

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::{Franchise, FranchiseDetail};
use crate::database::FranchiseRepository;
use crate::handlers::require;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/franchise - Every franchise with its stores; admins also see franchise admins
pub async fn franchise_list_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Franchise>> {
    require(&auth, Action::ReadFranchises, ResourceContext::none())?;

    let franchises = state.db.list_franchises(auth.identity.is_admin()).await?;
    Ok(ApiResponse::success(franchises))
}

/// GET /api/franchise/:user_id - Franchises the user is a franchisee of, with store revenue
pub async fn user_franchises_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<FranchiseDetail>> {
    require(&auth, Action::ReadUserFranchises, ResourceContext::user(user_id))?;

    let franchises = state.db.franchises_for_user(user_id).await?;
    Ok(ApiResponse::success(franchises))
}
