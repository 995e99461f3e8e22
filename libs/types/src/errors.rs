//! Error taxonomy for the book and engine surfaces
//!
//! All errors are local and recoverable; no operation partially mutates
//! state on failure.

use thiserror::Error;

/// Errors raised at the book boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("duplicate order id: {order_id}")]
    DuplicateId { order_id: u64 },

    #[error("order not found: {order_id}")]
    NotFound { order_id: u64 },

    #[error("price {price} is not a positive multiple of unit {unit}")]
    PriceNotOnGrid { price: i64, unit: i64 },
}

/// Errors returned by matching-engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("duplicate order id: {order_id}")]
    DuplicateId { order_id: u64 },

    #[error("order not found: {order_id}")]
    NotFound { order_id: u64 },

    #[error(transparent)]
    Book(#[from] BookError),
}
