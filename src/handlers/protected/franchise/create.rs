// handlers/protected/franchise/create.rs - POST /api/franchise handler

use axum::extract::{Extension, State};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::{FranchiseDetail, NewFranchise};
use crate::database::{FranchiseRepository, UserRepository};
use crate::error::ApiError;
use crate::handlers::{require, required_fields};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct AdminRef {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFranchiseRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub admins: Vec<AdminRef>,
}

/// POST /api/franchise - Create a franchise and make the listed users its franchisees
///
/// 404 when an admin email does not belong to a registered user, 409 when the name is taken.
pub async fn franchise_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateFranchiseRequest>,
) -> ApiResult<FranchiseDetail> {
    require(&auth, Action::CreateFranchise, ResourceContext::none())?;
    required_fields(&[("name", payload.name.as_deref())])?;

    let mut admin_ids = Vec::with_capacity(payload.admins.len());
    for admin in &payload.admins {
        let record = state
            .db
            .find_user_by_email(admin.email.trim())
            .await?
            .ok_or_else(|| ApiError::not_found(format!("unknown user for franchise admin {}", admin.email)))?;
        // one grant per user, however often the email is listed
        if !admin_ids.contains(&record.user.id) {
            admin_ids.push(record.user.id);
        }
    }

    let franchise = state
        .db
        .create_franchise(NewFranchise {
            name: payload.name.unwrap_or_default().trim().to_string(),
            admin_ids,
        })
        .await?;

    info!("Franchise {} created by {}", franchise.id, auth.identity.user_id);
    Ok(ApiResponse::success(franchise))
}
