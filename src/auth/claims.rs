use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Role, RoleGrant, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleGrant>,
    /// Makes every issued token distinct, even for the same user within one second.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            jti: Uuid::new_v4(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Who a validated token speaks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleGrant>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|grant| grant.role == Role::Admin)
    }

    pub fn is_franchisee_of(&self, franchise_id: i64) -> bool {
        self.roles
            .iter()
            .any(|grant| grant.role == Role::Franchisee && grant.object_id == Some(franchise_id))
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        }
    }
}
