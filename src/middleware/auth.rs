use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::marker::PhantomData;

use crate::auth::{authorize, Guarded, Principal, TokenError};
use crate::domain::UserLookup;
use crate::error::AppError;
use crate::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing credentials".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid credentials".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Unauthorized("invalid credentials".to_string())),
    }
}

/// Resolves the caller from `Authorization: Bearer <access token>`.
///
/// The role is read from the stored user, not from the token.
#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts)?;

        let claims = state.tokens.verify_access(token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected access token");
            match e {
                TokenError::Expired => AppError::Unauthorized("expired token".to_string()),
                _ => AppError::Unauthorized("invalid credentials".to_string()),
            }
        })?;

        let user = state
            .users
            .find(UserLookup::Id(claims.user_id))
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::Unauthorized("invalid credentials".to_string()),
                other => other,
            })?;

        Ok(Principal::new(user.id, user.role))
    }
}

/// A principal that passed the capability check for operation `O`.
pub struct Authorized<O: Guarded> {
    pub principal: Principal,
    operation: PhantomData<O>,
}

#[axum::async_trait]
impl<O: Guarded> FromRequestParts<AppState> for Authorized<O> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let principal = Principal::from_request_parts(parts, state).await?;
        authorize(&principal, O::OPERATION)?;

        Ok(Self {
            principal,
            operation: PhantomData,
        })
    }
}
