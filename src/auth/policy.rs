//! Capability table: which principals may run which operation.

use super::principal::Principal;
use crate::domain::Role;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateProduct,
    ListOwnProducts,
    BrowseProducts,
    CreateOrder,
    AcceptOrder,
    ListTransactions,
    TransactionHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    AnyAuthenticated,
    Only(Role),
}

pub fn required_access(operation: Operation) -> Access {
    match operation {
        Operation::CreateProduct => Access::Only(Role::Seller),
        Operation::ListOwnProducts => Access::Only(Role::Seller),
        Operation::BrowseProducts => Access::AnyAuthenticated,
        Operation::CreateOrder => Access::Only(Role::Buyer),
        Operation::AcceptOrder => Access::Only(Role::Seller),
        Operation::ListTransactions => Access::AnyAuthenticated,
        Operation::TransactionHistory => Access::Only(Role::Buyer),
    }
}

pub fn authorize(principal: &Principal, operation: Operation) -> Result<(), AppError> {
    match required_access(operation) {
        Access::AnyAuthenticated => Ok(()),
        Access::Only(role) => principal.require(role).map_err(|e| {
            tracing::warn!(
                user_id = principal.user_id,
                role = %principal.role,
                ?operation,
                "Operation denied"
            );
            e
        }),
    }
}

/// Type-level handle on an [`Operation`], used by the `Authorized` extractor.
pub trait Guarded: Send + Sync + 'static {
    const OPERATION: Operation;
}

pub mod op {
    use super::{Guarded, Operation};

    macro_rules! guarded {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;

                impl Guarded for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    guarded!(
        CreateProduct,
        ListOwnProducts,
        BrowseProducts,
        CreateOrder,
        AcceptOrder,
        ListTransactions,
        TransactionHistory,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Operation; 7] = [
        Operation::CreateProduct,
        Operation::ListOwnProducts,
        Operation::BrowseProducts,
        Operation::CreateOrder,
        Operation::AcceptOrder,
        Operation::ListTransactions,
        Operation::TransactionHistory,
    ];

    #[test]
    fn buyer_capabilities() {
        let buyer = Principal::new(2, Role::Buyer);
        let allowed: Vec<_> = ALL
            .iter()
            .filter(|op| authorize(&buyer, **op).is_ok())
            .copied()
            .collect();

        assert_eq!(
            allowed,
            vec![
                Operation::BrowseProducts,
                Operation::CreateOrder,
                Operation::ListTransactions,
                Operation::TransactionHistory,
            ]
        );
    }

    #[test]
    fn seller_capabilities() {
        let seller = Principal::new(1, Role::Seller);
        let allowed: Vec<_> = ALL
            .iter()
            .filter(|op| authorize(&seller, **op).is_ok())
            .copied()
            .collect();

        assert_eq!(
            allowed,
            vec![
                Operation::CreateProduct,
                Operation::ListOwnProducts,
                Operation::BrowseProducts,
                Operation::AcceptOrder,
                Operation::ListTransactions,
            ]
        );
    }

    #[test]
    fn denial_is_unauthorized() {
        let seller = Principal::new(1, Role::Seller);
        let err = authorize(&seller, Operation::TransactionHistory).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn markers_point_at_their_operation() {
        assert_eq!(<op::CreateOrder as Guarded>::OPERATION, Operation::CreateOrder);
        assert_eq!(<op::AcceptOrder as Guarded>::OPERATION, Operation::AcceptOrder);
    }
}
