//! The `StorefrontStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `storefront-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::{
  cart::{CartItem, CartItemId, CartLine},
  error::StoreError,
  product::{Category, CategoryCount, NewProduct, Product, ProductId},
  session::SessionId,
};

// ─── Catalog query ───────────────────────────────────────────────────────────

/// Ordering applied to a catalog listing.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
  PriceAsc,
  PriceDesc,
  NameAsc,
  NameDesc,
  /// Most recently created first.
  #[default]
  Newest,
}

impl SortOrder {
  /// Parse a sort key, falling back to [`SortOrder::Newest`] for anything
  /// unrecognised (clients send presentation-only keys such as `featured`).
  pub fn parse_lenient(s: &str) -> Self { s.parse().unwrap_or_default() }
}

/// Parameters for [`StorefrontStore::list_products`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
  pub category: Option<Category>,
  /// Case-insensitive substring of the product name.
  pub search:   Option<String>,
  pub sort:     SortOrder,
  /// 1-based page number.
  pub page:     u32,
  pub limit:    u32,
}

impl ProductQuery {
  pub const DEFAULT_LIMIT: u32 = 10;
  pub const MAX_LIMIT: u32 = 100;

  /// Number of rows to skip for `page`.
  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
  }
}

impl Default for ProductQuery {
  fn default() -> Self {
    Self {
      category: None,
      search:   None,
      sort:     SortOrder::default(),
      page:     1,
      limit:    Self::DEFAULT_LIMIT,
    }
  }
}

/// Pagination metadata for a catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page:        u32,
  pub limit:       u32,
  /// Number of products matching the filters across all pages.
  pub total:       u64,
  pub total_pages: u64,
  pub has_next:    bool,
  pub has_prev:    bool,
}

impl Pagination {
  pub fn new(page: u32, limit: u32, total: u64) -> Self {
    let total_pages = if limit == 0 { 0 } else { total.div_ceil(u64::from(limit)) };
    Self {
      page,
      limit,
      total,
      total_pages,
      has_next: u64::from(page) < total_pages,
      has_prev: page > 1,
    }
  }
}

/// One page of a catalog listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
  pub products:   Vec<Product>,
  pub pagination: Pagination,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a storefront storage backend.
///
/// Catalog methods are plain reads. Every cart mutation must apply the rules
/// in [`crate::reconcile`] atomically: the cart row and the product's stock
/// change together or not at all, and stock never becomes negative even
/// under concurrent calls.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StorefrontStore: Send + Sync {
  type Error: StoreError;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Return the page of products matching `query`, with the total count of
  /// the full matching set.
  fn list_products<'a>(
    &'a self,
    query: &'a ProductQuery,
  ) -> impl Future<Output = Result<ProductPage, Self::Error>> + Send + 'a;

  /// Retrieve a product by id. Returns `None` if not found.
  fn get_product(
    &self,
    id: ProductId,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// Count products per category. Every category appears, including empty
  /// ones.
  fn category_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<CategoryCount>, Self::Error>> + Send + '_;

  /// Insert a product into the catalog.
  fn add_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  // ── Cart reads ────────────────────────────────────────────────────────

  /// The session's cart lines, most recently added first.
  fn cart_lines<'a>(
    &'a self,
    session: &'a SessionId,
  ) -> impl Future<Output = Result<Vec<CartLine>, Self::Error>> + Send + 'a;

  // ── Cart mutations ────────────────────────────────────────────────────

  /// Reserve `quantity` units of `product_id` in the session's cart.
  ///
  /// Fails with `ProductNotFound` or `OutOfStock`; nothing is written on
  /// failure.
  fn add_item<'a>(
    &'a self,
    session: &'a SessionId,
    product_id: ProductId,
    quantity: u32,
  ) -> impl Future<Output = Result<CartItem, Self::Error>> + Send + 'a;

  /// Set the quantity of one of the session's items, moving the difference
  /// into or out of stock.
  ///
  /// Fails with `CartItemNotFound` (including when the item belongs to a
  /// different session) or `OutOfStock`.
  fn set_quantity<'a>(
    &'a self,
    session: &'a SessionId,
    item_id: CartItemId,
    quantity: u32,
  ) -> impl Future<Output = Result<CartItem, Self::Error>> + Send + 'a;

  /// Delete one of the session's items and return its units to stock.
  /// Returns the removed item.
  fn remove_item<'a>(
    &'a self,
    session: &'a SessionId,
    item_id: CartItemId,
  ) -> impl Future<Output = Result<CartItem, Self::Error>> + Send + 'a;

  /// Delete every item in the session's cart and return all units to stock.
  /// Returns the removed items; an empty cart yields an empty vector.
  fn clear_cart<'a>(
    &'a self,
    session: &'a SessionId,
  ) -> impl Future<Output = Result<Vec<CartItem>, Self::Error>> + Send + 'a;
}
