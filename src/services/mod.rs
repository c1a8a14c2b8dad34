pub mod auth;
pub mod orders;
pub mod products;
pub mod users;

pub use auth::{AuthService, LoginRequest};
pub use orders::{
    AcceptOrderRequest, CreateOrderRequest, HistoryEntry, OrderService, TransactionHistory,
    TransactionQuery,
};
pub use products::{CreateProductRequest, ProductService};
pub use users::UserService;
