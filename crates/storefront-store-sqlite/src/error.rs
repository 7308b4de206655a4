//! Error type for `storefront-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business-rule rejection (missing row, insufficient stock, ...).
  #[error(transparent)]
  Core(#[from] storefront_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not decode into its domain type.
  #[error("corrupt column value: {0}")]
  Corrupt(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl storefront_core::StoreError for Error {
  fn domain(&self) -> Option<&storefront_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}
