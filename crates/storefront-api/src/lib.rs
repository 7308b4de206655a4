//! JSON REST API for the storefront.
//!
//! Exposes an axum [`Router`] backed by any
//! [`storefront_core::store::StorefrontStore`]. TLS, tracing layers and the
//! listening socket are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", storefront_api::api_router(state))
//! ```

pub mod cart;
pub mod envelope;
pub mod error;
pub mod products;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use rust_decimal::Decimal;
use storefront_core::store::StorefrontStore;

pub use envelope::Envelope;
pub use error::ApiError;
pub use session::{CurrentSession, HeaderSessionResolver, MissingSession, SessionResolver};

// ─── Application state ────────────────────────────────────────────────────────

/// Knobs the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Flat tax rate applied to every cart subtotal, in percent.
  pub tax_percentage:         Decimal,
  /// Return infrastructure error messages to clients instead of a generic
  /// message. Intended for development only.
  pub expose_internal_errors: bool,
}

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<dyn SessionResolver>,
  pub settings: Arc<ApiSettings>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: Arc::clone(&self.sessions),
      settings: Arc::clone(&self.settings),
    }
  }
}

impl<S: StorefrontStore> ApiState<S> {
  /// Map a store failure to an [`ApiError`] under the configured exposure
  /// policy.
  pub fn store_error(&self, err: S::Error) -> ApiError {
    ApiError::from_store(err, self.settings.expose_internal_errors)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: StorefrontStore + 'static,
{
  Router::new()
    // Catalog
    .route("/products", get(products::list::<S>))
    .route("/products/search", get(products::search::<S>))
    .route("/products/categories", get(products::categories::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    // Cart
    .route(
      "/cart",
      get(cart::show::<S>).post(cart::add::<S>).delete(cart::clear::<S>),
    )
    .route("/cart/{id}", put(cart::update::<S>).delete(cart::remove::<S>))
    .with_state(state)
}
