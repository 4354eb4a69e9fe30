use thiserror::Error;

use crate::database::DatabaseError;

/// Failures of the token authority and the authorization guard
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("token has been revoked or expired")]
    Revoked,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("forbidden")]
    Forbidden,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Persistence(#[from] DatabaseError),
}
