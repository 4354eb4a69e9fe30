use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Franchisee,
    Diner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Franchisee => "franchisee",
            Role::Diner => "diner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "franchisee" => Ok(Role::Franchisee),
            "diner" => Ok(Role::Diner),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A role held by a user. Franchisee grants carry the franchise id in `object_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrant {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
}

impl RoleGrant {
    pub fn admin() -> Self {
        Self { role: Role::Admin, object_id: None }
    }

    pub fn diner() -> Self {
        Self { role: Role::Diner, object_id: None }
    }

    pub fn franchisee(franchise_id: i64) -> Self {
        Self { role: Role::Franchisee, object_id: Some(franchise_id) }
    }
}

/// Public user profile; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleGrant>,
}

/// Stored user row including the bcrypt hash, used only for credential checks.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<RoleGrant>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_grant_serializes_lowercase_and_omits_missing_object() {
        let json = serde_json::to_value(RoleGrant::diner()).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "diner" }));

        let json = serde_json::to_value(RoleGrant::franchisee(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "franchisee", "objectId": 7 }));
    }

    #[test]
    fn role_parses_from_storage_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Franchisee.as_str().parse::<Role>().unwrap(), Role::Franchisee);
        assert!("root".parse::<Role>().is_err());
    }
}
