use crate::domain::Role;
use crate::error::AppError;

/// The authenticated caller, resolved from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::Unauthorized(format!(
                "{} role required",
                role.to_string().to_lowercase()
            )));
        }

        Ok(())
    }
}
