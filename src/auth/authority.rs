use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::claims::{Claims, Identity};
use super::password::verify_password;
use super::AuthError;
use crate::database::models::User;
use crate::database::{SessionRepository, UserRepository};
use crate::metrics::MetricsSink;

/// A freshly signed token and the profile it was minted for
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
}

/// Sessions are keyed by this digest so the table never holds usable bearer tokens.
pub fn token_hash(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Issues, validates and revokes bearer tokens.
///
/// A token is honored only while its session row exists, so revocation takes effect on the
/// next validation. Holds no mutable state of its own.
pub struct TokenAuthority {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        secret: &str,
        ttl: Duration,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }

        Ok(Self {
            users,
            sessions,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        })
    }

    /// Checks credentials and opens a session.
    pub async fn issue(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let record = self
            .users
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !verify_password(password, &record.password_hash).await? {
            debug!("Password mismatch for user {}", record.user.id);
            return Err(AuthError::Unauthorized);
        }

        self.mint(record.user).await
    }

    /// Opens a session for a user whose credentials were already established.
    pub async fn mint(&self, user: User) -> Result<IssuedToken, AuthError> {
        let issued_at = Utc::now();
        let claims = Claims::new(&user, issued_at, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        self.sessions
            .insert_session(&token_hash(&token), user.id, issued_at)
            .await?;

        debug!("Issued token {} for user {}", claims.jti, user.id);
        Ok(IssuedToken { user, token })
    }

    pub async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Revoked,
                _ => AuthError::Malformed(e.to_string()),
            })?
            .claims;

        if !self.sessions.session_exists(&token_hash(token)).await? {
            return Err(AuthError::Revoked);
        }

        Ok(Identity::from(claims))
    }

    /// Ends the session. Unknown and already revoked tokens succeed as well.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let removed = self.sessions.delete_session(&token_hash(token)).await?;
        if !removed {
            debug!("Revoke of an inactive token");
        }
        Ok(())
    }

    /// Drops sessions whose tokens have outlived the ttl.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(self.sessions.delete_sessions_issued_before(now - self.ttl).await?)
    }
}

/// Periodically deletes expired sessions so expiry is also enforced by removal.
///
/// Swept sessions count as users leaving, so the active-user gauge tracks open sessions.
pub fn spawn_session_sweeper(
    tokens: Arc<TokenAuthority>,
    metrics: Arc<dyn MetricsSink>,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match tokens.sweep(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => {
                    info!("Swept {} expired sessions", removed);
                    metrics.adjust_active_users(-i64::try_from(removed).unwrap_or(i64::MAX));
                }
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::database::models::{NewUser, Role, RoleGrant};
    use crate::database::MemoryGateway;
    use crate::metrics::MetricsRegistry;

    const SECRET: &str = "test-secret";

    fn authority(gateway: &Arc<MemoryGateway>, ttl: Duration) -> TokenAuthority {
        TokenAuthority::new(gateway.clone(), gateway.clone(), SECRET, ttl).unwrap()
    }

    async fn register(gateway: &MemoryGateway, email: &str, password: &str, roles: Vec<RoleGrant>) -> User {
        gateway
            .add_user(NewUser {
                name: "pizza diner".to_string(),
                email: email.to_string(),
                password_hash: hash_password(password, 4).await.unwrap(),
                roles,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn issue_then_validate_yields_registered_identity() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        let issued = tokens.issue("a@x.com", "pw123").await.unwrap();
        assert_eq!(issued.user, user);
        assert_eq!(issued.user.roles[0].role, Role::Diner);

        let identity = tokens.validate(&issued.token).await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.roles, user.roles);
    }

    #[tokio::test]
    async fn issue_distinguishes_unknown_user_from_bad_password() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        assert!(matches!(
            tokens.issue("a@x.com", "wrongpw").await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            tokens.issue("nobody@x.com", "pw123").await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn tokens_for_the_same_user_are_distinct() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        let first = tokens.mint(user.clone()).await.unwrap();
        let second = tokens.mint(user).await.unwrap();
        assert_ne!(first.token, second.token);

        tokens.revoke(&first.token).await.unwrap();
        assert!(tokens.validate(&second.token).await.is_ok());
    }

    #[tokio::test]
    async fn revoked_token_no_longer_validates() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        let issued = tokens.issue("a@x.com", "pw123").await.unwrap();
        tokens.revoke(&issued.token).await.unwrap();

        assert!(matches!(tokens.validate(&issued.token).await, Err(AuthError::Revoked)));
        // second revoke is still fine
        tokens.revoke(&issued.token).await.unwrap();
    }

    #[tokio::test]
    async fn garbage_and_foreign_tokens_are_malformed() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        assert!(matches!(tokens.validate("not.a.jwt").await, Err(AuthError::Malformed(_))));

        let other = TokenAuthority::new(gateway.clone(), gateway.clone(), "other-secret", Duration::hours(1)).unwrap();
        let foreign = other.mint(user).await.unwrap();
        assert!(matches!(tokens.validate(&foreign.token).await, Err(AuthError::Malformed(_))));
    }

    #[tokio::test]
    async fn expired_token_reads_as_revoked() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(-2));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;

        let issued = tokens.mint(user).await.unwrap();
        assert!(matches!(tokens.validate(&issued.token).await, Err(AuthError::Revoked)));
    }

    #[tokio::test]
    async fn sweep_removes_sessions_older_than_ttl() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = authority(&gateway, Duration::hours(1));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;
        let issued = tokens.mint(user).await.unwrap();

        assert_eq!(tokens.sweep(Utc::now()).await.unwrap(), 0);
        assert_eq!(tokens.sweep(Utc::now() + Duration::hours(2)).await.unwrap(), 1);
        assert!(matches!(tokens.validate(&issued.token).await, Err(AuthError::Revoked)));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_lowers_active_users() {
        let gateway = Arc::new(MemoryGateway::new());
        let tokens = Arc::new(authority(&gateway, Duration::hours(-2)));
        let user = register(&gateway, "a@x.com", "pw123", vec![RoleGrant::diner()]).await;
        tokens.mint(user).await.unwrap();

        let metrics = Arc::new(MetricsRegistry::new("jwt-pizza-service-test").unwrap());
        metrics.adjust_active_users(3);

        let handle = spawn_session_sweeper(tokens, metrics.clone(), std::time::Duration::from_secs(60));
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;

        assert_eq!(metrics.snapshot().active_users, 2);
        handle.abort();
    }

    #[test]
    fn empty_secret_is_rejected() {
        let gateway = Arc::new(MemoryGateway::new());
        assert!(TokenAuthority::new(gateway.clone(), gateway, "", Duration::hours(1)).is_err());
    }
}
