// handlers/public/menu.rs - GET /api/order/menu handler

use axum::extract::State;

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::MenuItem;
use crate::database::MenuRepository;
use crate::handlers::require_anonymous;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/order/menu - The full menu, readable without a token
pub async fn menu_get(State(state): State<AppState>) -> ApiResult<Vec<MenuItem>> {
    require_anonymous(Action::ReadMenu, ResourceContext::none())?;
    let menu = state.db.list_menu().await?;
    Ok(ApiResponse::success(menu))
}
