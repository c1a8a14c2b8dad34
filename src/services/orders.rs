//! Order placement, acceptance and the listing/history views.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::products::ProductService;
use super::users::UserService;
use crate::auth::Principal;
use crate::domain::transaction::HistoryState;
use crate::domain::{
    NewTransaction, Role, TransactionDetail, TransactionFilter, TransactionStatus, UserLookup,
};
use crate::error::AppError;
use crate::ports::{Scope, TransactionRepository};
use crate::validation::{validate_id, validate_ids, validate_price, ValidationError};

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub principal: Principal,
    pub seller_id: i64,
    pub items: Vec<i64>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_id("BuyerID", self.principal.user_id)?;
        validate_id("SellerID", self.seller_id)?;
        validate_ids("Items", &self.items)?;
        self.principal.require(Role::Buyer)?;
        if self.principal.user_id == self.seller_id {
            return Err(ValidationError::new("SellerID", "must differ from the buyer").into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AcceptOrderRequest {
    pub principal: Principal,
    pub transaction_id: i64,
}

impl AcceptOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_id("SellerID", self.principal.user_id)?;
        validate_id("TransactionID", self.transaction_id)?;
        self.principal.require(Role::Seller)?;
        Ok(())
    }
}

/// Whose transactions to list: the principal's own.
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    pub principal: Principal,
}

impl TransactionQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_id("UserID", self.principal.user_id)?;
        Ok(())
    }

    fn filter(&self) -> TransactionFilter {
        TransactionFilter::for_party(self.principal.user_id, self.principal.role)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    pub transaction: TransactionDetail,
    pub status: HistoryState,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionHistory {
    pub transactions: Vec<HistoryEntry>,
    pub coupons: i64,
}

pub struct OrderService {
    users: Arc<UserService>,
    products: Arc<ProductService>,
    transactions: Arc<dyn TransactionRepository>,
}

impl OrderService {
    pub fn new(
        users: Arc<UserService>,
        products: Arc<ProductService>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            users,
            products,
            transactions,
        }
    }

    /// Places a pending order and returns the coupon estimate.
    ///
    /// The estimate is not stored; acceptance recomputes the authoritative
    /// count from the snapshots.
    pub async fn create_order(
        &self,
        scope: &mut Scope,
        request: CreateOrderRequest,
    ) -> Result<i32, AppError> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Rejected order");
            return Err(e);
        }

        let seller = self.users.find(UserLookup::Id(request.seller_id)).await?;
        let buyer = self
            .users
            .find(UserLookup::Id(request.principal.user_id))
            .await?;

        let mut products = Vec::with_capacity(request.items.len());
        for product_id in &request.items {
            products.push(self.products.find(*product_id, seller.id).await?);
        }

        let order = NewTransaction::snapshot(buyer.id, seller.id, &products);
        if let Err(e) = validate_price("GrandTotal", &order.grand_total) {
            tracing::warn!(buyer_id = buyer.id, seller_id = seller.id, error = %e, "Rejected order total");
            return Err(e.into());
        }
        let coupons = order.estimated_coupons();

        let id = self.transactions.insert(scope, &order).await.map_err(|e| {
            tracing::error!(buyer_id = buyer.id, seller_id = seller.id, error = %e, "Failed to insert order");
            AppError::from(e)
        })?;

        tracing::info!(
            transaction_id = id,
            buyer_id = buyer.id,
            seller_id = seller.id,
            grand_total = %order.grand_total,
            coupons,
            "Order created"
        );

        Ok(coupons)
    }

    /// Seller accepts one of their orders; stored coupons are recomputed.
    pub async fn accept_order(
        &self,
        scope: &mut Scope,
        request: AcceptOrderRequest,
    ) -> Result<(), AppError> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Rejected order acceptance");
            return Err(e);
        }

        let seller_id = request.principal.user_id;
        let transaction = self
            .transactions
            .find_for_seller(request.transaction_id, seller_id)
            .await
            .map_err(|e| {
                tracing::warn!(transaction_id = request.transaction_id, seller_id, error = %e, "Order lookup failed");
                AppError::from(e)
            })?;

        let coupons = transaction.accepted_coupons();

        self.transactions
            .update_status(
                scope,
                transaction.id,
                seller_id,
                TransactionStatus::Accepted,
                coupons,
            )
            .await
            .map_err(|e| {
                tracing::error!(transaction_id = transaction.id, error = %e, "Failed to accept order");
                AppError::from(e)
            })?;

        tracing::info!(transaction_id = transaction.id, seller_id, coupons, "Order accepted");
        Ok(())
    }

    pub async fn find_all(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<TransactionDetail>, AppError> {
        if let Err(e) = query.validate() {
            tracing::warn!(error = %e, "Rejected transaction listing");
            return Err(e);
        }

        self.transactions.list(&query.filter()).await.map_err(|e| {
            tracing::error!(user_id = query.principal.user_id, error = %e, "Failed to list transactions");
            AppError::from(e)
        })
    }

    /// Accepted transactions with their Open/Closed label and the coupon total.
    pub async fn find_history(&self, query: TransactionQuery) -> Result<TransactionHistory, AppError> {
        if let Err(e) = query.validate() {
            tracing::warn!(error = %e, "Rejected history lookup");
            return Err(e);
        }

        let filter = query.filter().with_status(TransactionStatus::Accepted);
        let transactions = self.transactions.list(&filter).await.map_err(|e| {
            tracing::error!(user_id = query.principal.user_id, error = %e, "Failed to load history");
            AppError::from(e)
        })?;

        let now = Utc::now();
        let coupons = transactions
            .iter()
            .map(|detail| i64::from(detail.transaction.coupons))
            .sum();
        let transactions = transactions
            .into_iter()
            .map(|detail| HistoryEntry {
                status: HistoryState::at(detail.transaction.created_at, now),
                transaction: detail,
            })
            .collect();

        Ok(TransactionHistory {
            transactions,
            coupons,
        })
    }
}
