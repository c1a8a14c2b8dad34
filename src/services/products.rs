use bigdecimal::BigDecimal;
use std::sync::Arc;

use crate::auth::Principal;
use crate::domain::{NewProduct, Product, Role};
use crate::error::AppError;
use crate::ports::{ProductRepository, Scope};
use crate::validation::{
    sanitize_string, validate_id, validate_max_len, validate_price,
    validate_required, PRICE_SCALE, PRODUCT_DESCRIPTION_MAX_LEN, PRODUCT_NAME_MAX_LEN,
};

#[derive(Debug, Clone)]
pub struct CreateProductRequest {
    pub principal: Principal,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_id("SellerID", self.principal.user_id)?;
        self.principal.require(Role::Seller)?;
        validate_required("Name", &self.name)?;
        validate_max_len("Name", &self.name, PRODUCT_NAME_MAX_LEN)?;
        validate_max_len("Description", &self.description, PRODUCT_DESCRIPTION_MAX_LEN)?;
        validate_price("Price", &self.price)?;
        Ok(())
    }
}

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn create(
        &self,
        scope: &mut Scope,
        request: CreateProductRequest,
    ) -> Result<i64, AppError> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Rejected product");
            return Err(e);
        }

        let product = NewProduct {
            seller_id: request.principal.user_id,
            name: sanitize_string(&request.name),
            description: request.description.trim().to_string(),
            price: request.price.with_scale(PRICE_SCALE),
        };

        let id = self.products.insert(scope, &product).await.map_err(|e| {
            tracing::error!(seller_id = product.seller_id, error = %e, "Failed to insert product");
            AppError::from(e)
        })?;

        tracing::info!(product_id = id, seller_id = product.seller_id, "Product created");
        Ok(id)
    }

    /// The catalog of `seller_id`; empty when the seller has no products.
    pub async fn find_all(&self, seller_id: i64) -> Result<Vec<Product>, AppError> {
        if let Err(e) = validate_id("SellerID", seller_id) {
            tracing::warn!(error = %e, "Rejected product listing");
            return Err(e.into());
        }

        self.products.list_by_seller(seller_id).await.map_err(|e| {
            tracing::error!(seller_id, error = %e, "Failed to list products");
            AppError::from(e)
        })
    }

    /// Product `id` as long as `seller_id` owns it.
    pub async fn find(&self, id: i64, seller_id: i64) -> Result<Product, AppError> {
        if let Err(e) = validate_id("ID", id).and_then(|_| validate_id("SellerID", seller_id)) {
            tracing::warn!(product_id = id, seller_id, error = %e, "Rejected product lookup");
            return Err(e.into());
        }

        self.products
            .find_for_seller(id, seller_id)
            .await
            .map_err(|e| {
                tracing::warn!(product_id = id, seller_id, error = %e, "Product lookup failed");
                AppError::from(e)
            })
    }
}
