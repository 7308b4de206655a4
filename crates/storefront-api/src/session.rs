//! Session resolution.
//!
//! Handlers never parse headers themselves: the [`CurrentSession`] extractor
//! asks the [`SessionResolver`] held in [`ApiState`] to identify the cart
//! owner for each request.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use storefront_core::{session::SessionId, store::StorefrontStore};

use crate::{ApiState, error::ApiError};

/// Request/response header carrying the session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// Identifies the cart owner of a request.
pub trait SessionResolver: Send + Sync + 'static {
  fn resolve(&self, headers: &HeaderMap) -> Result<SessionId, ApiError>;
}

/// What to do when a request carries no session header.
#[derive(Debug, Clone)]
pub enum MissingSession {
  /// Share one fixed identifier among all header-less clients.
  Fixed(SessionId),
  /// Mint a fresh random identifier; the client learns it from the echoed
  /// response header.
  Generate,
}

/// Trusts the `X-Session-Id` request header.
#[derive(Debug, Clone)]
pub struct HeaderSessionResolver {
  missing: MissingSession,
}

impl HeaderSessionResolver {
  pub fn new(missing: MissingSession) -> Self { Self { missing } }

  /// Fall back to `id` when the header is absent.
  pub fn with_fallback(id: SessionId) -> Self { Self::new(MissingSession::Fixed(id)) }
}

impl SessionResolver for HeaderSessionResolver {
  fn resolve(&self, headers: &HeaderMap) -> Result<SessionId, ApiError> {
    match headers.get(SESSION_HEADER) {
      Some(value) => {
        let raw = value
          .to_str()
          .map_err(|_| storefront_core::Error::InvalidSession("non-ASCII header".into()))?;
        Ok(SessionId::new(raw)?)
      }
      None => match &self.missing {
        MissingSession::Fixed(id) => Ok(id.clone()),
        MissingSession::Generate => {
          Ok(SessionId::new(format!("session-{}", uuid::Uuid::new_v4().simple()))?)
        }
      },
    }
  }
}

/// Extractor yielding the resolved session for the current request.
pub struct CurrentSession(pub SessionId);

impl<S> FromRequestParts<ApiState<S>> for CurrentSession
where
  S: StorefrontStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.sessions.resolve(&parts.headers).map(CurrentSession)
  }
}
