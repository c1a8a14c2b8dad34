use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{settle, Payload};
use crate::auth::policy::op;
use crate::domain::TransactionDetail;
use crate::error::AppError;
use crate::middleware::Authorized;
use crate::response::Envelope;
use crate::services::{
    AcceptOrderRequest, CreateOrderRequest, TransactionHistory, TransactionQuery,
};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateOrderBody {
    #[serde(rename = "SellerID", default)]
    pub seller_id: i64,
    #[serde(default)]
    pub items: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponEstimate {
    pub coupons: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptOrderBody {
    #[serde(rename = "TransactionID", default)]
    pub transaction_id: i64,
}

#[utoipa::path(
    post,
    path = "/v1/transaction",
    request_body = CreateOrderBody,
    responses(
        (status = 200, description = "Order placed; coupon estimate in Data", body = CouponEstimate),
        (status = 400, description = "Invalid order"),
        (status = 401, description = "Not authenticated as a buyer"),
        (status = 404, description = "Unknown seller or product")
    ),
    security(("bearer" = [])),
    tag = "Transactions"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::CreateOrder>,
    Payload(body): Payload<CreateOrderBody>,
) -> Result<Envelope<CouponEstimate>, AppError> {
    let request = CreateOrderRequest {
        principal,
        seller_id: body.seller_id,
        items: body.items,
    };

    let mut scope = state.database.begin().await?;
    let result = state.orders.create_order(&mut scope, request).await;
    let coupons = settle(scope, result).await?;

    Ok(Envelope::success(CouponEstimate { coupons }))
}

#[utoipa::path(
    post,
    path = "/v1/transaction/accept",
    request_body = AcceptOrderBody,
    responses(
        (status = 200, description = "Order accepted"),
        (status = 400, description = "Invalid transaction id"),
        (status = 401, description = "Not authenticated as a seller"),
        (status = 404, description = "No such order for this seller")
    ),
    security(("bearer" = [])),
    tag = "Transactions"
)]
pub async fn accept_order(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::AcceptOrder>,
    Payload(body): Payload<AcceptOrderBody>,
) -> Result<Envelope<()>, AppError> {
    let request = AcceptOrderRequest {
        principal,
        transaction_id: body.transaction_id,
    };

    let mut scope = state.database.begin().await?;
    let result = state.orders.accept_order(&mut scope, request).await;
    settle(scope, result).await?;

    Ok(Envelope::empty())
}

#[utoipa::path(
    get,
    path = "/v1/transaction",
    responses(
        (status = 200, description = "Orders where the caller is buyer or seller", body = [TransactionDetail]),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::ListTransactions>,
) -> Result<Envelope<Vec<TransactionDetail>>, AppError> {
    let transactions = state.orders.find_all(TransactionQuery { principal }).await?;
    Ok(Envelope::success(transactions))
}

#[utoipa::path(
    get,
    path = "/v1/transaction/history",
    responses(
        (status = 200, description = "Accepted orders and the coupon total", body = TransactionHistory),
        (status = 401, description = "Not authenticated as a buyer")
    ),
    security(("bearer" = [])),
    tag = "Transactions"
)]
pub async fn transaction_history(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::TransactionHistory>,
) -> Result<Envelope<TransactionHistory>, AppError> {
    let history = state.orders.find_history(TransactionQuery { principal }).await?;
    Ok(Envelope::success(history))
}
