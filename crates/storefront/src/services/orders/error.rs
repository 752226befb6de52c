//! Order lifecycle error types.

use thiserror::Error;

use bazaar_core::OrderNumber;

use crate::store::StoreError;

/// Errors from the order lifecycle.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no line that resolves to a catalog product.
    #[error("cart is empty")]
    EmptyCart,

    #[error("order not found: {0}")]
    OrderNotFound(OrderNumber),

    /// Payment cannot be resumed on a confirmed order.
    #[error("order {0} is already confirmed")]
    AlreadySettled(OrderNumber),

    /// Every generated order number collided with an existing one.
    #[error("could not generate a unique order number")]
    NumberSpaceExhausted,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
