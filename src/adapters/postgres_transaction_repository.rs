//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::postgres_scope;
use crate::domain::{
    ItemSnapshot, NewTransaction, Role, Transaction, TransactionDetail, TransactionFilter,
    TransactionStatus, User,
};
use crate::ports::{RepositoryError, RepositoryResult, Scope, TransactionRepository};

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(
        &self,
        scope: &mut Scope,
        transaction: &NewTransaction,
    ) -> RepositoryResult<i64> {
        let tx = postgres_scope(scope)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO transactions (buyer_id, seller_id, grand_total, status, items)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(transaction.buyer_id)
        .bind(transaction.seller_id)
        .bind(&transaction.grand_total)
        .bind(TransactionStatus::Pending.as_str())
        .bind(Json(&transaction.items))
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<TransactionDetail>> {
        let rows = sqlx::query_as::<_, TransactionDetailRow>(
            r#"
            SELECT t.id, t.buyer_id, t.seller_id, t.grand_total, t.status, t.coupons, t.items,
                   t.created_at, t.updated_at,
                   s.username AS seller_username, s.role AS seller_role,
                   s.created_at AS seller_created_at, s.updated_at AS seller_updated_at,
                   b.username AS buyer_username, b.role AS buyer_role,
                   b.created_at AS buyer_created_at, b.updated_at AS buyer_updated_at
            FROM transactions t
            JOIN users s ON s.id = t.seller_id
            JOIN users b ON b.id = t.buyer_id
            WHERE ($1::BIGINT IS NULL OR t.buyer_id = $1)
              AND ($2::BIGINT IS NULL OR t.seller_id = $2)
              AND ($3::TEXT IS NULL OR t.status = $3)
            ORDER BY t.id DESC
            "#,
        )
        .bind(filter.buyer_id)
        .bind(filter.seller_id)
        .bind(filter.status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionDetailRow::into_domain).collect()
    }

    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, buyer_id, seller_id, grand_total, status, coupons, items,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1 AND seller_id = $2
            "#,
        )
        .bind(id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound("transaction".to_string()))?
            .into_domain()
    }

    async fn update_status(
        &self,
        scope: &mut Scope,
        id: i64,
        seller_id: i64,
        status: TransactionStatus,
        coupons: i32,
    ) -> RepositoryResult<()> {
        let tx = postgres_scope(scope)?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, coupons = $2, updated_at = NOW()
            WHERE id = $3 AND seller_id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(coupons)
        .bind(id)
        .bind(seller_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("transaction".to_string()));
        }

        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    buyer_id: i64,
    seller_id: i64,
    grand_total: BigDecimal,
    status: String,
    coupons: i32,
    items: Json<Vec<ItemSnapshot>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let status = self
            .status
            .parse::<TransactionStatus>()
            .map_err(RepositoryError::Decode)?;

        Ok(Transaction {
            id: self.id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            grand_total: self.grand_total,
            status,
            coupons: self.coupons,
            items: self.items.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionDetailRow {
    #[sqlx(flatten)]
    transaction: TransactionRow,
    seller_username: String,
    seller_role: String,
    seller_created_at: DateTime<Utc>,
    seller_updated_at: DateTime<Utc>,
    buyer_username: String,
    buyer_role: String,
    buyer_created_at: DateTime<Utc>,
    buyer_updated_at: DateTime<Utc>,
}

impl TransactionDetailRow {
    fn into_domain(self) -> RepositoryResult<TransactionDetail> {
        let transaction = self.transaction.into_domain()?;

        let seller = party(
            transaction.seller_id,
            self.seller_username,
            &self.seller_role,
            self.seller_created_at,
            self.seller_updated_at,
        )?;
        let buyer = party(
            transaction.buyer_id,
            self.buyer_username,
            &self.buyer_role,
            self.buyer_created_at,
            self.buyer_updated_at,
        )?;

        Ok(TransactionDetail {
            transaction,
            seller,
            buyer,
        })
    }
}

// Joined parties carry no password hash; it is never serialized anyway.
fn party(
    id: i64,
    username: String,
    role: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> RepositoryResult<User> {
    let role = role
        .parse::<Role>()
        .map_err(|e| RepositoryError::Decode(format!("user {}: {}", id, e)))?;

    Ok(User {
        id,
        username,
        password_hash: String::new(),
        role,
        created_at,
        updated_at,
    })
}
