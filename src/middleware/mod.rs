pub mod auth;
pub mod request_logger;

pub use auth::Authorized;
pub use request_logger::request_logger_middleware;
