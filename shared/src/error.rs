//! Domain rule violations raised by the pure order and stock logic

use thiserror::Error;

use crate::models::{Capability, OrderAction, OrderStatus};

/// A business rule that rejected an operation before anything was written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("User lacks the {0} capability")]
    PermissionDenied(Capability),

    #[error("Cannot {action} an order that is {current}")]
    InvalidState {
        current: OrderStatus,
        action: OrderAction,
    },

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Order has already been delivered")]
    AlreadyDelivered,

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("Stock quantity would overflow")]
    StockOverflow,
}
