//! Framework-agnostic marketplace entities.

pub mod product;
pub mod transaction;
pub mod user;

pub use product::{NewProduct, Product};
pub use transaction::{
    ItemSnapshot, NewTransaction, Transaction, TransactionDetail, TransactionFilter,
    TransactionStatus,
};
pub use user::{Role, User, UserLookup};
