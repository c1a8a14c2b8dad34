use axum::extract::State;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::{settle, Payload, QueryParams};
use crate::auth::policy::op;
use crate::domain::Product;
use crate::error::AppError;
use crate::middleware::Authorized;
use crate::response::Envelope;
use crate::services::CreateProductRequest;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProductBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "50000")]
    pub price: BigDecimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseQuery {
    /// Seller whose catalog to list.
    pub seller: i64,
}

#[utoipa::path(
    post,
    path = "/v1/product",
    request_body = CreateProductBody,
    responses(
        (status = 200, description = "Product created"),
        (status = 400, description = "Invalid product"),
        (status = 401, description = "Not authenticated as a seller")
    ),
    security(("bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::CreateProduct>,
    Payload(body): Payload<CreateProductBody>,
) -> Result<Envelope<()>, AppError> {
    let request = CreateProductRequest {
        principal,
        name: body.name,
        description: body.description,
        price: body.price,
    };

    let mut scope = state.database.begin().await?;
    let result = state.products.create(&mut scope, request).await;
    settle(scope, result).await?;

    Ok(Envelope::empty())
}

#[utoipa::path(
    get,
    path = "/v1/product",
    responses(
        (status = 200, description = "The caller's own catalog", body = [Product]),
        (status = 401, description = "Not authenticated as a seller")
    ),
    security(("bearer" = [])),
    tag = "Products"
)]
pub async fn list_own_products(
    State(state): State<AppState>,
    Authorized { principal, .. }: Authorized<op::ListOwnProducts>,
) -> Result<Envelope<Vec<Product>>, AppError> {
    let products = state.products.find_all(principal.user_id).await?;
    Ok(Envelope::success(products))
}

#[utoipa::path(
    get,
    path = "/v1/product/list",
    params(BrowseQuery),
    responses(
        (status = 200, description = "Catalog of the given seller", body = [Product]),
        (status = 400, description = "Missing or invalid seller"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "Products"
)]
pub async fn browse_products(
    State(state): State<AppState>,
    _caller: Authorized<op::BrowseProducts>,
    QueryParams(query): QueryParams<BrowseQuery>,
) -> Result<Envelope<Vec<Product>>, AppError> {
    let products = state.products.find_all(query.seller).await?;
    Ok(Envelope::success(products))
}
