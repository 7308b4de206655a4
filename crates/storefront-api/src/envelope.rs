//! The success envelope shared by every endpoint.

use serde::Serialize;
use storefront_core::store::Pagination;

/// `{"success": true, "message"?: ..., "data": ..., "pagination"?: ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success:    bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:    Option<&'static str>,
  pub data:       T,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, message: None, data, pagination: None }
  }

  pub fn with_message(mut self, message: &'static str) -> Self {
    self.message = Some(message);
    self
  }

  pub fn with_pagination(mut self, pagination: Pagination) -> Self {
    self.pagination = Some(pagination);
    self
  }
}
