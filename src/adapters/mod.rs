//! Storage adapters implementing the repository ports.

pub mod memory;
pub mod postgres_product_repository;
pub mod postgres_transaction_repository;
pub mod postgres_user_repository;

pub use memory::MemoryStore;
pub use postgres_product_repository::PostgresProductRepository;
pub use postgres_transaction_repository::PostgresTransactionRepository;
pub use postgres_user_repository::PostgresUserRepository;

use sqlx::Postgres;

use crate::ports::{RepositoryError, RepositoryResult, Scope};

fn postgres_scope(scope: &mut Scope) -> RepositoryResult<&mut sqlx::Transaction<'static, Postgres>> {
    match scope {
        Scope::Postgres(tx) => Ok(tx),
        Scope::Memory(_) => Err(RepositoryError::ScopeMismatch),
    }
}
