pub mod password;
pub mod policy;
pub mod principal;
pub mod token;

pub use policy::{authorize, Access, Guarded, Operation};
pub use principal::Principal;
pub use token::{Claims, TokenError, TokenIssuer, TokenKind, TokenPair};
