//! Error types for server setup and catalog seeding.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Config(#[from] config::ConfigError),

  #[error("invalid default session id: {0}")]
  Session(#[from] storefront_core::Error),

  #[error("invalid CORS origin: {0:?}")]
  CorsOrigin(String),

  #[error("failed to read seed file {path:?}: {source}")]
  SeedRead {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("seed file {path:?} is not a JSON array of products: {source}")]
  SeedParse {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
