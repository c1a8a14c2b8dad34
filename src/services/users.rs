use std::sync::Arc;

use crate::domain::{User, UserLookup};
use crate::error::AppError;
use crate::ports::{RepositoryError, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Exactly one live user matching `lookup`, or `NotFound("user")`.
    pub async fn find(&self, lookup: UserLookup) -> Result<User, AppError> {
        self.users.find(&lookup).await.map_err(|e| {
            match &e {
                RepositoryError::NotFound(_) => tracing::warn!(%lookup, "User not found"),
                other => tracing::error!(%lookup, error = %other, "User lookup failed"),
            }
            AppError::from(e)
        })
    }
}
