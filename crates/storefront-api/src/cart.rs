//! Handlers for `/cart` endpoints.
//!
//! | Method   | Path        | Notes |
//! |----------|-------------|-------|
//! | `GET`    | `/cart`     | Current cart with summary |
//! | `POST`   | `/cart`     | Body: `{"productId":1,"quantity":2}` |
//! | `DELETE` | `/cart`     | Empties the cart and restocks every item |
//! | `PUT`    | `/cart/:id` | Body: `{"quantity":3}` |
//! | `DELETE` | `/cart/:id` | Removes one item and restocks it |
//!
//! Every response carries the resolved session in the `X-Session-Id` header.

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use storefront_core::{
  cart::{CartItemId, CartView},
  product::ProductId,
  reconcile::validate_quantity,
  session::SessionId,
  store::StorefrontStore,
};
use tracing::info;

use crate::{
  ApiState, Envelope,
  error::ApiError,
  session::{CurrentSession, SESSION_HEADER},
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn load_view<S: StorefrontStore>(
  state: &ApiState<S>,
  session: &SessionId,
) -> Result<CartView, ApiError> {
  let lines = state
    .store
    .cart_lines(session)
    .await
    .map_err(|e| state.store_error(e))?;
  Ok(CartView::new(lines, state.settings.tax_percentage))
}

fn respond(session: &SessionId, envelope: Envelope<CartView>) -> Response {
  ([(SESSION_HEADER, session.as_str().to_owned())], Json(envelope)).into_response()
}

fn item_id(path: Result<Path<i64>, PathRejection>) -> Result<CartItemId, ApiError> {
  let Path(id) = path?;
  if id < 1 {
    return Err(ApiError::Validation("Valid cart item ID is required".into()));
  }
  Ok(id)
}

// ─── Show ─────────────────────────────────────────────────────────────────────

/// `GET /cart`
pub async fn show<S>(
  State(state): State<ApiState<S>>,
  CurrentSession(session): CurrentSession,
) -> Result<Response, ApiError>
where
  S: StorefrontStore + 'static,
{
  let view = load_view(&state, &session).await?;
  Ok(respond(&session, Envelope::ok(view)))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /cart`. Both fields are required; absence
/// is reported with the same message as an out-of-range value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBody {
  pub product_id: Option<ProductId>,
  pub quantity:   Option<i64>,
}

/// `POST /cart`
pub async fn add<S>(
  State(state): State<ApiState<S>>,
  CurrentSession(session): CurrentSession,
  body: Result<Json<AddBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: StorefrontStore + 'static,
{
  let Json(body) = body?;
  let product_id = body
    .product_id
    .filter(|id| *id >= 1)
    .ok_or_else(|| ApiError::Validation("Valid product ID is required".into()))?;
  let quantity = validate_quantity(body.quantity.unwrap_or(0))?;

  let item = state
    .store
    .add_item(&session, product_id, quantity)
    .await
    .map_err(|e| state.store_error(e))?;
  info!(
    session = %session,
    product_id,
    added = quantity,
    quantity = item.quantity,
    "cart item added"
  );

  let view = load_view(&state, &session).await?;
  Ok(respond(
    &session,
    Envelope::ok(view).with_message("Product added to cart successfully"),
  ))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /cart/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub quantity: i64,
}

/// `PUT /cart/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  CurrentSession(session): CurrentSession,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: StorefrontStore + 'static,
{
  let id = item_id(path)?;
  let Json(body) = body?;
  let quantity = validate_quantity(body.quantity)?;

  let item = state
    .store
    .set_quantity(&session, id, quantity)
    .await
    .map_err(|e| state.store_error(e))?;
  info!(session = %session, item_id = id, quantity = item.quantity, "cart item updated");

  let view = load_view(&state, &session).await?;
  Ok(respond(
    &session,
    Envelope::ok(view).with_message("Cart item updated successfully"),
  ))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /cart/:id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  CurrentSession(session): CurrentSession,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError>
where
  S: StorefrontStore + 'static,
{
  let id = item_id(path)?;

  let removed = state
    .store
    .remove_item(&session, id)
    .await
    .map_err(|e| state.store_error(e))?;
  info!(
    session = %session,
    item_id = id,
    restocked = removed.quantity,
    "cart item removed"
  );

  let view = load_view(&state, &session).await?;
  Ok(respond(
    &session,
    Envelope::ok(view).with_message("Item removed from cart successfully"),
  ))
}

// ─── Clear ────────────────────────────────────────────────────────────────────

/// `DELETE /cart`
pub async fn clear<S>(
  State(state): State<ApiState<S>>,
  CurrentSession(session): CurrentSession,
) -> Result<Response, ApiError>
where
  S: StorefrontStore + 'static,
{
  let removed = state
    .store
    .clear_cart(&session)
    .await
    .map_err(|e| state.store_error(e))?;
  info!(session = %session, items = removed.len(), "cart cleared");

  Ok(respond(
    &session,
    Envelope::ok(CartView::empty(state.settings.tax_percentage))
      .with_message("Cart cleared successfully"),
  ))
}
