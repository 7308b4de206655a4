//! Core types and trait definitions for the storefront.
//!
//! This crate has no HTTP or database dependencies. It holds
//! the catalog and cart model, the stock reconciliation rules, and the cart
//! totals calculator.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cart;
pub mod error;
pub mod product;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod totals;

pub use error::{Error, Result, StoreError};
