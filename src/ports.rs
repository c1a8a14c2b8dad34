//! Repository ports consumed by the service layer.
//!
//! Reads go straight to the store; writes take the request's [`Scope`] so that
//! everything a request writes commits or rolls back as one unit.

use async_trait::async_trait;
use std::any::Any;

use crate::domain::{
    NewProduct, NewTransaction, Product, Transaction, TransactionDetail, TransactionFilter,
    TransactionStatus, User, UserLookup,
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored data could not be decoded: {0}")]
    Decode(String),

    #[error("storage scope does not belong to this store")]
    ScopeMismatch,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Writes held back by a non-SQL store until the scope settles.
#[async_trait]
pub trait StagedWrites: Send + Sync {
    async fn apply(self: Box<Self>);

    fn discard(self: Box<Self>);

    /// Lets the owning store recover its concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One storage-level transaction, opened at the handler boundary.
pub enum Scope {
    Postgres(sqlx::Transaction<'static, sqlx::Postgres>),
    Memory(Box<dyn StagedWrites>),
}

impl Scope {
    pub async fn commit(self) -> RepositoryResult<()> {
        match self {
            Scope::Postgres(tx) => tx.commit().await.map_err(RepositoryError::from),
            Scope::Memory(staged) => {
                staged.apply().await;
                Ok(())
            }
        }
    }

    pub async fn rollback(self) -> RepositoryResult<()> {
        match self {
            Scope::Postgres(tx) => tx.rollback().await.map_err(RepositoryError::from),
            Scope::Memory(staged) => {
                staged.discard();
                Ok(())
            }
        }
    }
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> RepositoryResult<Scope>;

    async fn ping(&self) -> RepositoryResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, lookup: &UserLookup) -> RepositoryResult<User>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, scope: &mut Scope, product: &NewProduct) -> RepositoryResult<i64>;

    async fn list_by_seller(&self, seller_id: i64) -> RepositoryResult<Vec<Product>>;

    /// Product `id` only if it belongs to `seller_id`.
    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Product>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, scope: &mut Scope, transaction: &NewTransaction)
        -> RepositoryResult<i64>;

    /// Newest first, with both parties attached.
    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<TransactionDetail>>;

    /// Transaction `id` only if `seller_id` sold it.
    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Transaction>;

    async fn update_status(
        &self,
        scope: &mut Scope,
        id: i64,
        seller_id: i64,
        status: TransactionStatus,
        coupons: i32,
    ) -> RepositoryResult<()>;
}
