//! Cart totals calculator.
//!
//! Sums are carried at full precision and rounded half-up to two decimal
//! places only when the summary is produced.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::cart::CartSummary;

/// Number of decimal places in every monetary summary value.
pub const MONEY_SCALE: u32 = 2;

/// Anything with a unit price and a quantity.
pub trait PricedLine {
  fn unit_price(&self) -> Decimal;
  fn quantity(&self) -> u32;
}

impl PricedLine for (Decimal, u32) {
  fn unit_price(&self) -> Decimal { self.0 }

  fn quantity(&self) -> u32 { self.1 }
}

fn round_money(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute subtotal, tax and total for `lines` at `tax_percentage` percent.
pub fn summarize<L: PricedLine>(lines: &[L], tax_percentage: Decimal) -> CartSummary {
  let subtotal: Decimal = lines
    .iter()
    .map(|l| l.unit_price() * Decimal::from(l.quantity()))
    .sum();
  let tax = subtotal * tax_percentage / Decimal::ONE_HUNDRED;
  let total = subtotal + tax;

  CartSummary {
    subtotal: round_money(subtotal),
    tax: round_money(tax),
    total: round_money(total),
    tax_percentage,
  }
}
