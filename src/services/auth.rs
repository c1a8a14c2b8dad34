//! Credential check and token issuing for `POST /v1/auth/login`.

use std::sync::Arc;

use super::users::UserService;
use crate::auth::password::verify_password;
use crate::auth::{TokenIssuer, TokenPair};
use crate::domain::UserLookup;
use crate::error::AppError;
use crate::validation::{validate_max_len, validate_required, USERNAME_MAX_LEN};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_required("Username", &self.username)?;
        validate_max_len("Username", &self.username, USERNAME_MAX_LEN)?;
        validate_required("Password", &self.password)?;
        Ok(())
    }
}

pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    /// Returns a fresh access/refresh pair for valid credentials.
    ///
    /// An unknown username surfaces as `NotFound` and a bad password as
    /// `InvalidCredentials`; callers facing the network should not tell them apart.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AppError> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Rejected login");
            return Err(e);
        }

        let user = self
            .users
            .find(UserLookup::Username(request.username.trim().to_string()))
            .await?;

        let matches = verify_password(&request.password, &user.password_hash)
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
                AppError::Internal("password verification failed".to_string())
            })?;

        if !matches {
            tracing::warn!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.tokens.issue(user.id).map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Failed to issue tokens");
            AppError::Internal("token signing failed".to_string())
        })?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::Role;
    use chrono::Duration;

    async fn service() -> (AuthService, Arc<TokenIssuer>) {
        let store = MemoryStore::new();
        let hash = bcrypt::hash("secret", 4).unwrap();
        store.insert_user("Buyer", &hash, Role::Buyer).await;

        let tokens = Arc::new(TokenIssuer::new(
            "test_secret_key",
            Duration::minutes(15),
            Duration::hours(24),
        ));
        let users = Arc::new(UserService::new(Arc::new(store)));
        (AuthService::new(users, tokens.clone()), tokens)
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn valid_credentials_issue_a_token_pair() {
        let (auth, tokens) = service().await;

        let pair = auth.login(login("Buyer", "secret")).await.unwrap();
        assert_ne!(pair.token, pair.refresh_token);
        assert_eq!(tokens.verify_access(&pair.token).unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (auth, _) = service().await;

        let err = auth.login(login("Buyer", "wrongpassword")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (auth, _) = service().await;

        let err = auth.login(login("Nobody", "secret")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_fields_fail_validation() {
        let (auth, _) = service().await;

        let err = auth.login(login("", "secret")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.field == "Username"));

        let err = auth.login(login("Buyer", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.field == "Password"));
    }
}
