use axum::extract::State;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{settle, Payload};
use crate::auth::TokenPair;
use crate::error::AppError;
use crate::response::Envelope;
use crate::services::LoginRequest;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Token pair in the Data field", body = TokenPair),
        (status = 400, description = "Missing fields or invalid username or password")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<LoginBody>,
) -> Result<Envelope<TokenPair>, AppError> {
    let request = LoginRequest {
        username: body.username,
        password: body.password,
    };

    let scope = state.database.begin().await?;
    let result = state.auth.login(request).await.map_err(|e| match e {
        AppError::NotFound(_) | AppError::InvalidCredentials => AppError::InvalidCredentials,
        other => other,
    });
    let pair = settle(scope, result).await?;

    Ok(Envelope::success(pair))
}
