pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod response;
pub mod services;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::TokenIssuer;
use crate::ports::Database;
use crate::services::{AuthService, OrderService, ProductService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn Database>,
    pub users: Arc<UserService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenIssuer>,
    pub log_request_body: bool,
    pub start_time: Instant,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::login,
        handlers::products::create_product,
        handlers::products::list_own_products,
        handlers::products::browse_products,
        handlers::transactions::create_order,
        handlers::transactions::accept_order,
        handlers::transactions::list_transactions,
        handlers::transactions::transaction_history,
    ),
    components(schemas(
        auth::TokenPair,
        domain::Role,
        domain::User,
        domain::Product,
        domain::ItemSnapshot,
        domain::TransactionStatus,
        domain::Transaction,
        domain::TransactionDetail,
        domain::transaction::HistoryState,
        services::HistoryEntry,
        services::TransactionHistory,
        handlers::auth::LoginBody,
        handlers::products::CreateProductBody,
        handlers::transactions::CreateOrderBody,
        handlers::transactions::AcceptOrderBody,
        handlers::transactions::CouponEstimate,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and token issuing"),
        (name = "Products", description = "Seller catalogs"),
        (name = "Transactions", description = "Orders, acceptance and coupon history"),
        (name = "Health", description = "Liveness and storage reachability")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/v1/auth/login", post(handlers::auth::login))
        .route(
            "/v1/product",
            post(handlers::products::create_product).get(handlers::products::list_own_products),
        )
        .route("/v1/product/list", get(handlers::products::browse_products))
        .route(
            "/v1/transaction",
            post(handlers::transactions::create_order)
                .get(handlers::transactions::list_transactions),
        )
        .route("/v1/transaction/accept", post(handlers::transactions::accept_order))
        .route(
            "/v1/transaction/history",
            get(handlers::transactions::transaction_history),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
