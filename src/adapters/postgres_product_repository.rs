//! Postgres implementation of ProductRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::postgres_scope;
use crate::domain::{NewProduct, Product};
use crate::ports::{ProductRepository, RepositoryError, RepositoryResult, Scope};

#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn insert(&self, scope: &mut Scope, product: &NewProduct) -> RepositoryResult<i64> {
        let tx = postgres_scope(scope)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO products (seller_id, name, description, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(product.seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.price)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn list_by_seller(&self, seller_id: i64) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, seller_id, name, description, price, created_at, updated_at
            FROM products
            WHERE seller_id = $1 AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_domain).collect())
    }

    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, seller_id, name, description, price, created_at, updated_at
            FROM products
            WHERE id = $1 AND seller_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_domain)
            .ok_or_else(|| RepositoryError::NotFound("product".to_string()))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    seller_id: i64,
    name: String,
    description: String,
    price: BigDecimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_domain(self) -> Product {
        Product {
            id: self.id,
            seller_id: self.seller_id,
            name: self.name,
            description: self.description,
            price: self.price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
