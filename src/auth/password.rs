//! bcrypt password verification.

/// Checks `password` against a stored bcrypt hash.
///
/// bcrypt compares digests in constant time. The work factor makes this CPU
/// bound, so it runs on the blocking pool.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .unwrap_or(Err(bcrypt::BcryptError::InvalidHash(
            "verification task aborted".to_string(),
        )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_matching_password() {
        let hash = bcrypt::hash("secret", 4).unwrap();
        assert!(verify_password("secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let hash = bcrypt::hash("secret", 4).unwrap();
        assert!(!verify_password("wrongpassword", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(verify_password("secret", "not-a-hash").await.is_err());
    }
}
