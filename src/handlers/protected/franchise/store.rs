// handlers/protected/franchise/store.rs - Store endpoints under a franchise

use axum::extract::{Extension, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::{NewStore, Store};
use crate::database::FranchiseRepository;
use crate::handlers::{require, required_fields};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: Option<String>,
}

/// POST /api/franchise/:franchise_id/store
pub async fn store_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(franchise_id): Path<i64>,
    ApiJson(payload): ApiJson<CreateStoreRequest>,
) -> ApiResult<Store> {
    require(&auth, Action::CreateStore, ResourceContext::franchise(franchise_id))?;
    required_fields(&[("name", payload.name.as_deref())])?;

    let store = state
        .db
        .create_store(NewStore {
            franchise_id,
            name: payload.name.unwrap_or_default().trim().to_string(),
        })
        .await?;

    info!("Store {} opened in franchise {}", store.id, franchise_id);
    Ok(ApiResponse::success(store))
}

/// DELETE /api/franchise/:franchise_id/store/:store_id
pub async fn store_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((franchise_id, store_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    require(&auth, Action::DeleteStore, ResourceContext::franchise(franchise_id))?;

    state.db.delete_store(franchise_id, store_id).await?;

    info!("Store {} closed in franchise {}", store_id, franchise_id);
    Ok(ApiResponse::success(json!({ "message": "store deleted" })))
}
