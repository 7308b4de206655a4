//! Cart types.
//!
//! A [`CartItem`] is the persisted reservation row. A [`CartLine`] is that row
//! joined with the product's display fields, and a [`CartView`] is the
//! computed read model returned to clients; it is never stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{product::ProductId, session::SessionId, totals::PricedLine};

pub type CartItemId = i64;

// ─── Persisted row ───────────────────────────────────────────────────────────

/// One product reserved in one session's cart.
///
/// At most one item exists per (session, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id:         CartItemId,
  pub session_id: SessionId,
  pub product_id: ProductId,
  pub quantity:   u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A cart item denormalised with the product fields a cart page displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub id:         CartItemId,
  pub product_id: ProductId,
  pub name:       String,
  #[serde(with = "rust_decimal::serde::float")]
  pub price:      Decimal,
  pub quantity:   u32,
  pub image_url:  String,
  /// `price * quantity`, unrounded.
  #[serde(with = "rust_decimal::serde::float")]
  pub subtotal:   Decimal,
}

impl CartLine {
  pub fn new(
    id: CartItemId,
    product_id: ProductId,
    name: String,
    price: Decimal,
    quantity: u32,
    image_url: String,
  ) -> Self {
    Self {
      id,
      product_id,
      name,
      price,
      quantity,
      image_url,
      subtotal: price * Decimal::from(quantity),
    }
  }
}

impl PricedLine for CartLine {
  fn unit_price(&self) -> Decimal { self.price }

  fn quantity(&self) -> u32 { self.quantity }
}

/// Monetary summary of a cart, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
  #[serde(with = "rust_decimal::serde::float")]
  pub subtotal:       Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub tax:            Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub total:          Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub tax_percentage: Decimal,
}

/// The computed cart returned by every cart endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
  pub items:   Vec<CartLine>,
  pub summary: CartSummary,
}

impl CartView {
  /// Build the view for `items`, computing the summary at `tax_percentage`.
  pub fn new(items: Vec<CartLine>, tax_percentage: Decimal) -> Self {
    let summary = crate::totals::summarize(&items, tax_percentage);
    Self { items, summary }
  }

  /// An empty cart at `tax_percentage`.
  pub fn empty(tax_percentage: Decimal) -> Self {
    Self::new(Vec::new(), tax_percentage)
  }
}
