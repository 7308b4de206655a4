//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order matches chronological order. Prices are
//! stored as decimal strings and categories as their lowercase names.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use storefront_core::{
  cart::{CartItem, CartLine},
  product::{Category, Product},
  session::SessionId,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_price(price: Decimal) -> String { price.normalize().to_string() }

pub fn decode_price(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str { c.as_static_str() }

pub fn decode_category(s: &str) -> Result<Category> {
  Category::parse(s).map_err(|_| Error::Corrupt(format!("unknown category: {s:?}")))
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub fn decode_session(s: String) -> Result<SessionId> {
  SessionId::new(s).map_err(|e| Error::Corrupt(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawProduct::from_row`].
pub const PRODUCT_COLUMNS: &str =
  "id, name, price, description, category, image_url, stock, created_at";

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub id:          i64,
  pub name:        String,
  pub price:       String,
  pub description: String,
  pub category:    String,
  pub image_url:   String,
  pub stock:       u32,
  pub created_at:  String,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      price:       row.get(2)?,
      description: row.get(3)?,
      category:    row.get(4)?,
      image_url:   row.get(5)?,
      stock:       row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      id:          self.id,
      name:        self.name,
      price:       decode_price(&self.price)?,
      description: self.description,
      category:    decode_category(&self.category)?,
      image_url:   self.image_url,
      stock:       self.stock,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawCartItem::from_row`].
pub const CART_ITEM_COLUMNS: &str =
  "id, session_id, product_id, quantity, created_at, updated_at";

/// Raw values read directly from a `cart_items` row.
pub struct RawCartItem {
  pub id:         i64,
  pub session_id: String,
  pub product_id: i64,
  pub quantity:   u32,
  pub created_at: String,
  pub updated_at: String,
}

impl RawCartItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      session_id: row.get(1)?,
      product_id: row.get(2)?,
      quantity:   row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_item(self) -> Result<CartItem> {
    Ok(CartItem {
      id:         self.id,
      session_id: decode_session(self.session_id)?,
      product_id: self.product_id,
      quantity:   self.quantity,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values from a `cart_items` row joined with its product.
pub struct RawCartLine {
  pub id:         i64,
  pub product_id: i64,
  pub quantity:   u32,
  pub name:       String,
  pub price:      String,
  pub image_url:  String,
}

impl RawCartLine {
  pub fn into_line(self) -> Result<CartLine> {
    Ok(CartLine::new(
      self.id,
      self.product_id,
      self.name,
      decode_price(&self.price)?,
      self.quantity,
      self.image_url,
    ))
  }
}
