use super::AuthError;

/// Hashes a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Checks a password against a stored bcrypt hash. The comparison itself is constant time.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_are_salted_and_verify() {
        let first = hash_password("pw123", 4).await.unwrap();
        let second = hash_password("pw123", 4).await.unwrap();

        assert_ne!(first, second);
        assert_ne!(first, "pw123");
        assert!(verify_password("pw123", &first).await.unwrap());
        assert!(!verify_password("wrongpw", &first).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_error_not_a_match() {
        let err = verify_password("pw123", "not-a-bcrypt-hash").await.unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }
}
