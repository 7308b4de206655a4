//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"success": false, "error": "<message>"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use storefront_core::StoreError;
use thiserror::Error;

/// Message shown in place of infrastructure errors unless exposure is enabled.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal Server Error";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  OutOfStock(String),

  /// An infrastructure fault. `public` is what the client sees.
  #[error("{public}")]
  Internal {
    public: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Translate a store failure, keeping business-rule rejections distinct
  /// from infrastructure faults. Fault details reach the client only when
  /// `expose` is set.
  pub fn from_store<E: StoreError>(err: E, expose: bool) -> Self {
    if let Some(domain) = err.domain() {
      return domain.clone().into();
    }
    let public = if expose {
      err.to_string()
    } else {
      GENERIC_INTERNAL_MESSAGE.to_owned()
    };
    ApiError::Internal { public, source: Box::new(err) }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::OutOfStock(_) => StatusCode::CONFLICT,
      ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<storefront_core::Error> for ApiError {
  fn from(err: storefront_core::Error) -> Self {
    use storefront_core::Error as E;
    match err {
      E::ProductNotFound(_) => ApiError::NotFound("Product not found".into()),
      E::CartItemNotFound(_) => ApiError::NotFound("Cart item not found".into()),
      E::OutOfStock { available, .. } => {
        ApiError::OutOfStock(format!("Insufficient stock: {available} available"))
      }
      E::InvalidQuantity(_) => {
        ApiError::Validation("Quantity must be at least 1".into())
      }
      e @ (E::NegativePrice(_) | E::InvalidSession(_) | E::UnknownCategory(_)) => {
        ApiError::Validation(e.to_string())
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::Validation(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::Validation(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    match &self {
      ApiError::Internal { source, .. } => {
        tracing::error!(error = %source, "request failed");
      }
      ApiError::OutOfStock(m) | ApiError::NotFound(m) => {
        tracing::warn!(status = status.as_u16(), "{m}");
      }
      ApiError::Validation(_) => {}
    }
    (status, Json(json!({ "success": false, "error": self.to_string() })))
      .into_response()
  }
}
