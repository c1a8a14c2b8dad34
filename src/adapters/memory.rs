//! In-memory store implementing every repository port.
//!
//! Writes are staged in a [`Journal`] and only become visible on commit, which
//! mirrors the Postgres scope closely enough for the service and HTTP tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{
    NewProduct, NewTransaction, Product, Role, Transaction, TransactionDetail, TransactionFilter,
    TransactionStatus, User, UserLookup,
};
use crate::ports::{
    Database, ProductRepository, RepositoryError, RepositoryResult, Scope, StagedWrites,
    TransactionRepository, UserRepository,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    transactions: BTreeMap<i64, Transaction>,
}

#[derive(Debug, Default)]
struct Sequences {
    users: AtomicI64,
    products: AtomicI64,
    transactions: AtomicI64,
}

fn next_id(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    sequences: Arc<Sequences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account directly; the service itself never creates users.
    pub async fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: next_id(&self.sequences.users),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    /// Rewrites the creation time of a committed transaction.
    pub async fn set_transaction_created_at(
        &self,
        id: i64,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let transaction = state
            .transactions
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound("transaction".to_string()))?;
        transaction.created_at = created_at;
        Ok(())
    }

    /// Overwrites the stored coupon count of a committed transaction.
    pub async fn set_transaction_coupons(&self, id: i64, coupons: i32) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let transaction = state
            .transactions
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound("transaction".to_string()))?;
        transaction.coupons = coupons;
        Ok(())
    }

    pub async fn transaction(&self, id: i64) -> Option<Transaction> {
        self.state.read().await.transactions.get(&id).cloned()
    }

    fn journal<'a>(&self, scope: &'a mut Scope) -> RepositoryResult<&'a mut Journal> {
        let Scope::Memory(staged) = scope else {
            return Err(RepositoryError::ScopeMismatch);
        };
        match staged.as_any_mut().downcast_mut::<Journal>() {
            Some(journal) if Arc::ptr_eq(&journal.state, &self.state) => Ok(journal),
            _ => Err(RepositoryError::ScopeMismatch),
        }
    }
}

#[derive(Debug)]
enum StagedWrite {
    InsertProduct(Product),
    InsertTransaction(Transaction),
    UpdateStatus {
        id: i64,
        status: TransactionStatus,
        coupons: i32,
        at: DateTime<Utc>,
    },
}

/// Writes staged by one request against a [`MemoryStore`].
pub struct Journal {
    state: Arc<RwLock<MemoryState>>,
    writes: Vec<StagedWrite>,
}

#[async_trait]
impl StagedWrites for Journal {
    async fn apply(self: Box<Self>) {
        let Journal { state, writes } = *self;
        let mut state = state.write().await;
        for write in writes {
            match write {
                StagedWrite::InsertProduct(product) => {
                    state.products.insert(product.id, product);
                }
                StagedWrite::InsertTransaction(transaction) => {
                    state.transactions.insert(transaction.id, transaction);
                }
                StagedWrite::UpdateStatus {
                    id,
                    status,
                    coupons,
                    at,
                } => {
                    if let Some(transaction) = state.transactions.get_mut(&id) {
                        transaction.status = status;
                        transaction.coupons = coupons;
                        transaction.updated_at = at;
                    }
                }
            }
        }
    }

    fn discard(self: Box<Self>) {
        if !self.writes.is_empty() {
            tracing::debug!(staged = self.writes.len(), "Discarding staged writes");
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[async_trait]
impl Database for MemoryStore {
    async fn begin(&self) -> RepositoryResult<Scope> {
        Ok(Scope::Memory(Box::new(Journal {
            state: Arc::clone(&self.state),
            writes: Vec::new(),
        })))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, lookup: &UserLookup) -> RepositoryResult<User> {
        let state = self.state.read().await;
        let found = match lookup {
            UserLookup::Id(id) => state.users.get(id),
            UserLookup::Username(username) => {
                state.users.values().find(|user| &user.username == username)
            }
        };

        found
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("user".to_string()))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert(&self, scope: &mut Scope, product: &NewProduct) -> RepositoryResult<i64> {
        let journal = self.journal(scope)?;
        let now = Utc::now();
        let id = next_id(&self.sequences.products);

        journal.writes.push(StagedWrite::InsertProduct(Product {
            id,
            seller_id: product.seller_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            created_at: now,
            updated_at: now,
        }));

        Ok(id)
    }

    async fn list_by_seller(&self, seller_id: i64) -> RepositoryResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|product| product.seller_id == seller_id)
            .cloned()
            .collect())
    }

    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Product> {
        let state = self.state.read().await;
        state
            .products
            .get(&id)
            .filter(|product| product.seller_id == seller_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("product".to_string()))
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn insert(
        &self,
        scope: &mut Scope,
        transaction: &NewTransaction,
    ) -> RepositoryResult<i64> {
        let journal = self.journal(scope)?;
        let now = Utc::now();
        let id = next_id(&self.sequences.transactions);

        journal.writes.push(StagedWrite::InsertTransaction(Transaction {
            id,
            buyer_id: transaction.buyer_id,
            seller_id: transaction.seller_id,
            grand_total: transaction.grand_total.clone(),
            status: TransactionStatus::Pending,
            coupons: 0,
            items: transaction.items.clone(),
            created_at: now,
            updated_at: now,
        }));

        Ok(id)
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<TransactionDetail>> {
        let state = self.state.read().await;

        state
            .transactions
            .values()
            .rev()
            .filter(|transaction| filter.matches(transaction))
            .map(|transaction| {
                let party = |id: i64| {
                    state.users.get(&id).cloned().ok_or_else(|| {
                        RepositoryError::Decode(format!(
                            "transaction {} references missing user {}",
                            transaction.id, id
                        ))
                    })
                };

                Ok(TransactionDetail {
                    transaction: transaction.clone(),
                    seller: party(transaction.seller_id)?,
                    buyer: party(transaction.buyer_id)?,
                })
            })
            .collect()
    }

    async fn find_for_seller(&self, id: i64, seller_id: i64) -> RepositoryResult<Transaction> {
        let state = self.state.read().await;
        state
            .transactions
            .get(&id)
            .filter(|transaction| transaction.seller_id == seller_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("transaction".to_string()))
    }

    async fn update_status(
        &self,
        scope: &mut Scope,
        id: i64,
        seller_id: i64,
        status: TransactionStatus,
        coupons: i32,
    ) -> RepositoryResult<()> {
        let owned = {
            let state = self.state.read().await;
            state
                .transactions
                .get(&id)
                .map_or(false, |transaction| transaction.seller_id == seller_id)
        };
        if !owned {
            return Err(RepositoryError::NotFound("transaction".to_string()));
        }

        self.journal(scope)?.writes.push(StagedWrite::UpdateStatus {
            id,
            status,
            coupons,
            at: Utc::now(),
        });

        Ok(())
    }
}
