//! Error types for `storefront-core`.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{cart::CartItemId, product::ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("product not found: {0}")]
  ProductNotFound(ProductId),

  #[error("cart item not found: {0}")]
  CartItemNotFound(CartItemId),

  #[error(
    "insufficient stock for product {product_id}: requested {requested}, \
     available {available}"
  )]
  OutOfStock {
    product_id: ProductId,
    requested:  u32,
    available:  u32,
  },

  #[error("quantity must be at least 1, got {0}")]
  InvalidQuantity(i64),

  #[error("price must not be negative, got {0}")]
  NegativePrice(Decimal),

  #[error("invalid session identifier: {0}")]
  InvalidSession(String),

  #[error("unknown category: {0:?}")]
  UnknownCategory(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by storage backend error types so that callers can recover the
/// domain-level cause (e.g. to choose an HTTP status) without knowing the
/// concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error behind this failure, if it was a business-rule
  /// rejection rather than an infrastructure fault.
  fn domain(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
