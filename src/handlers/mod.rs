pub mod auth;
pub mod products;
pub mod transactions;

use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::health::{check_health, StorageChecker};
use crate::ports::Scope;
use crate::AppState;

/// JSON body whose rejections render as the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

/// Query string whose rejections render as the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Commits `scope` when the request succeeded and rolls it back otherwise.
pub(crate) async fn settle<T>(scope: Scope, result: Result<T, AppError>) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            scope.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = scope.rollback().await {
                tracing::error!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Storage is unreachable")
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let checker = StorageChecker::new(state.database.clone());
    let report = check_health(&checker, state.start_time).await;

    let status_code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(report))
}
