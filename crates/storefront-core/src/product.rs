//! Catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

pub type ProductId = i64;

// ─── Category ────────────────────────────────────────────────────────────────

/// The fixed set of catalog categories.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  Innerwear,
  Men,
  Women,
  Kids,
}

impl Category {
  /// Parse a category from its lowercase wire form.
  pub fn parse(s: &str) -> crate::Result<Self> {
    s.parse()
      .map_err(|_| crate::Error::UnknownCategory(s.to_owned()))
  }

  /// Every category, in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// The lowercase wire form.
  pub fn as_static_str(self) -> &'static str { self.into() }
}

// ─── Product ─────────────────────────────────────────────────────────────────

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id:          ProductId,
  pub name:        String,
  #[serde(with = "rust_decimal::serde::float")]
  pub price:       Decimal,
  pub description: String,
  pub category:    Category,
  pub image_url:   String,
  /// Units available to be placed into any cart. Adding to a cart debits
  /// this count and removing from a cart credits it back, so it is not a
  /// physical warehouse count.
  pub stock:       u32,
  pub created_at:  DateTime<Utc>,
}

/// Input for inserting a product; used by catalog seeding.
///
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name:        String,
  pub price:       Decimal,
  #[serde(default)]
  pub description: String,
  pub category:    Category,
  #[serde(default)]
  pub image_url:   String,
  pub stock:       u32,
}

impl NewProduct {
  /// Reject inputs the catalog cannot hold. Stock is unsigned already.
  pub fn validate(&self) -> crate::Result<()> {
    if self.price.is_sign_negative() && !self.price.is_zero() {
      return Err(crate::Error::NegativePrice(self.price));
    }
    Ok(())
  }
}

/// Number of products listed under a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category: Category,
  pub count:    u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_round_trips_through_lowercase() {
    assert_eq!(Category::parse("men").unwrap(), Category::Men);
    assert_eq!(Category::Innerwear.as_ref(), "innerwear");
    assert_eq!(Category::Kids.to_string(), "kids");
    assert_eq!(Category::Women.as_static_str(), "women");
  }

  #[test]
  fn unknown_category_is_rejected() {
    assert_eq!(
      Category::parse("shoes"),
      Err(crate::Error::UnknownCategory("shoes".into()))
    );
  }

  #[test]
  fn new_product_accepts_numeric_price() {
    let p: NewProduct = serde_json::from_str(
      r#"{"name":"Cotton Brief","price":299.5,"category":"men","stock":4}"#,
    )
    .unwrap();
    assert_eq!(p.price, rust_decimal_macros::dec!(299.5));
    assert_eq!(p.category, Category::Men);
    assert!(p.description.is_empty());
  }

  #[test]
  fn negative_price_fails_validation() {
    let mut p: NewProduct = serde_json::from_str(
      r#"{"name":"Sock","price":-50,"category":"kids","stock":1}"#,
    )
    .unwrap();
    assert_eq!(
      p.validate(),
      Err(crate::Error::NegativePrice(rust_decimal_macros::dec!(-50)))
    );

    p.price = rust_decimal::Decimal::ZERO;
    assert_eq!(p.validate(), Ok(()));
  }
}
