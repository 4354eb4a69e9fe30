// handlers/mod.rs - Two-tier handler layout
//
// Public (no token) → Protected (bearer token validated by jwt_auth_middleware).
// Role and ownership checks for protected handlers all go through `require`.

pub mod protected;
pub mod public;

use tracing::warn;

use crate::auth::{authorize, Action, ResourceContext};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Runs the authorization guard for the caller and maps a denial to 403.
pub(crate) fn require(auth: &AuthUser, action: Action, resource: ResourceContext) -> Result<(), ApiError> {
    authorize(Some(&auth.identity), action, &resource)
        .into_result()
        .map_err(|err| {
            warn!("User {} denied {:?} on {:?}", auth.identity.user_id, action, resource);
            ApiError::from(err)
        })
}

/// Runs the authorization guard for a caller without a token.
pub(crate) fn require_anonymous(action: Action, resource: ResourceContext) -> Result<(), ApiError> {
    authorize(None, action, &resource).into_result().map_err(|err| {
        warn!("Anonymous caller denied {:?} on {:?}", action, resource);
        ApiError::from(err)
    })
}

/// Rejects the request with a 400 listing every absent or blank field.
pub(crate) fn required_fields(fields: &[(&'static str, Option<&str>)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |value| value.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::missing_fields(&missing))
    }
}
