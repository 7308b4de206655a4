//! Stock reconciliation rules.
//!
//! Every cart mutation is a paired write: the cart row changes and the
//! product's stock moves by the opposite amount. The functions here decide
//! *what* to write from the current rows; the store executes the plan inside
//! a single transaction so both halves commit together or not at all.
//!
//! Across all operations, `stock + Σ reserved quantities` for a product stays
//! constant and `stock` never drops below zero.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  cart::{CartItem, CartItemId},
  product::ProductId,
};

/// Validate a requested cart quantity from untrusted input.
pub fn validate_quantity(quantity: i64) -> Result<u32> {
  if quantity < 1 {
    return Err(Error::InvalidQuantity(quantity));
  }
  u32::try_from(quantity).map_err(|_| Error::InvalidQuantity(quantity))
}

// ─── Add ─────────────────────────────────────────────────────────────────────

/// The cart-row half of an add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartWrite {
  /// No item exists for (session, product); create one.
  Insert { quantity: u32 },
  /// An item exists; overwrite its quantity.
  Update { item_id: CartItemId, quantity: u32 },
}

/// What an add writes: the cart row plus the stock debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddPlan {
  pub write: CartWrite,
  /// Units to subtract from the product's stock.
  pub debit: u32,
}

/// Plan adding `quantity` units of `product_id` to a cart.
///
/// Only the increment is checked against `available`; units already held by
/// `existing` were debited when they were reserved.
pub fn plan_add(
  product_id: ProductId,
  available: u32,
  existing: Option<&CartItem>,
  quantity: u32,
) -> Result<AddPlan> {
  if quantity == 0 {
    return Err(Error::InvalidQuantity(0));
  }
  if available < quantity {
    return Err(Error::OutOfStock {
      product_id,
      requested: quantity,
      available,
    });
  }

  let write = match existing {
    Some(item) => CartWrite::Update {
      item_id:  item.id,
      quantity: item.quantity.checked_add(quantity).ok_or(
        Error::InvalidQuantity(i64::from(item.quantity) + i64::from(quantity)),
      )?,
    },
    None => CartWrite::Insert { quantity },
  };

  Ok(AddPlan { write, debit: quantity })
}

// ─── Set quantity ────────────────────────────────────────────────────────────

/// What a quantity change writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetQuantityPlan {
  pub quantity:    u32,
  /// Signed amount to subtract from stock; negative values credit stock.
  pub stock_delta: i64,
}

impl SetQuantityPlan {
  /// `true` when the product row does not need to be written.
  pub fn leaves_stock_unchanged(&self) -> bool { self.stock_delta == 0 }
}

/// Plan changing `item`'s quantity to `new_quantity`.
pub fn plan_set_quantity(
  item: &CartItem,
  available: u32,
  new_quantity: u32,
) -> Result<SetQuantityPlan> {
  if new_quantity == 0 {
    return Err(Error::InvalidQuantity(0));
  }
  let delta = i64::from(new_quantity) - i64::from(item.quantity);
  if delta > i64::from(available) {
    return Err(Error::OutOfStock {
      product_id: item.product_id,
      // `delta` is positive and bounded by `new_quantity` here.
      requested:  delta as u32,
      available,
    });
  }
  Ok(SetQuantityPlan { quantity: new_quantity, stock_delta: delta })
}

// ─── Remove / clear ──────────────────────────────────────────────────────────

/// Units to credit back to one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restock {
  pub product_id: ProductId,
  pub quantity:   u64,
}

/// Plan returning every unit held by `items` to stock.
///
/// Quantities are merged per product and ordered by product id, so a clear
/// touches each product row once and always in the same order.
pub fn plan_restock<'a>(
  items: impl IntoIterator<Item = &'a CartItem>,
) -> Vec<Restock> {
  let mut merged: BTreeMap<ProductId, u64> = BTreeMap::new();
  for item in items {
    *merged.entry(item.product_id).or_default() += u64::from(item.quantity);
  }
  merged
    .into_iter()
    .map(|(product_id, quantity)| Restock { product_id, quantity })
    .collect()
}
