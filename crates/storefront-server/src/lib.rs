//! HTTP server assembly for the storefront.
//!
//! Wraps the API router from `storefront-api` with the process-level pieces:
//! configuration, a health check, the JSON 404 fallback, request tracing,
//! and catalog seeding.

pub mod error;

pub use error::{Error, Result};

use std::{path::Path, sync::Arc};

use axum::{
  Json, Router,
  extract::OriginalUri,
  http::{HeaderName, HeaderValue, Method, StatusCode, header},
  response::IntoResponse,
  routing::get,
};
use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use storefront_api::{
  ApiSettings, ApiState, HeaderSessionResolver, MissingSession, api_router,
  session::SESSION_HEADER,
};
use storefront_core::{
  product::{NewProduct, Product},
  session::SessionId,
  store::StorefrontStore,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Name reported by the health check.
pub const SERVICE_NAME: &str = "storefront";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `storefront.toml` and
/// `STOREFRONT_*` environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                      String,
  pub port:                      u16,
  pub database_path:             String,
  /// Flat tax rate in percent.
  pub tax_percentage:            Decimal,
  /// Session used by clients that send no `X-Session-Id` header.
  pub default_session_id:        String,
  /// Give each header-less request a fresh session instead of
  /// `default_session_id`.
  pub generate_missing_sessions: bool,
  pub expose_internal_errors:    bool,
  /// Comma-separated browser origins allowed to call the API.
  pub cors_origin:               String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                      "0.0.0.0".into(),
      port:                      5000,
      database_path:             "storefront.db".into(),
      tax_percentage:            Decimal::from(18),
      default_session_id:        "demo-session-123".into(),
      generate_missing_sessions: false,
      expose_internal_errors:    false,
      cors_origin:               "http://localhost:3000".into(),
    }
  }
}

impl ServerConfig {
  /// Load from an optional TOML file, overridden by `STOREFRONT_*`
  /// environment variables.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("STOREFRONT"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Assemble the API state for `store` under this configuration.
  pub fn api_state<S>(&self, store: Arc<S>) -> Result<ApiState<S>> {
    let missing = if self.generate_missing_sessions {
      MissingSession::Generate
    } else {
      MissingSession::Fixed(SessionId::new(self.default_session_id.as_str())?)
    };
    Ok(ApiState {
      store,
      sessions: Arc::new(HeaderSessionResolver::new(missing)),
      settings: Arc::new(ApiSettings {
        tax_percentage:         self.tax_percentage,
        expose_internal_errors: self.expose_internal_errors,
      }),
    })
  }

  /// CORS policy for the configured origins. Credentials are allowed, so
  /// origins and headers are listed explicitly.
  pub fn cors_layer(&self) -> Result<CorsLayer> {
    let origins = self
      .cors_origin
      .split(',')
      .map(str::trim)
      .filter(|o| !o.is_empty())
      .map(|o| {
        HeaderValue::from_str(o).map_err(|_| Error::CorsOrigin(o.to_owned()))
      })
      .collect::<Result<Vec<_>>>()?;
    if origins.is_empty() {
      return Err(Error::CorsOrigin(self.cors_origin.clone()));
    }

    let session = HeaderName::from_static(SESSION_HEADER);
    Ok(
      CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, session.clone()])
        .expose_headers([session]),
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/health`, the API under `/api`, and
/// a JSON 404 for everything else.
pub fn router<S>(state: ApiState<S>, cors: CorsLayer) -> Router
where
  S: StorefrontStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .fallback(not_found)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
  Json(json!({
    "status": "OK",
    "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    "service": SERVICE_NAME,
    "version": env!("CARGO_PKG_VERSION"),
  }))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
  (
    StatusCode::NOT_FOUND,
    Json(json!({ "success": false, "error": format!("Route {uri} not found") })),
  )
}

// ─── Seeding ──────────────────────────────────────────────────────────────────

/// Parse a JSON array of products from `path`.
pub fn read_seed_file(path: &Path) -> Result<Vec<NewProduct>> {
  let raw = std::fs::read_to_string(path).map_err(|source| Error::SeedRead {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&raw).map_err(|source| Error::SeedParse {
    path: path.to_path_buf(),
    source,
  })
}

/// Insert every product into the catalog, in order.
pub async fn seed<S>(store: &S, products: Vec<NewProduct>) -> Result<Vec<Product>>
where
  S: StorefrontStore,
{
  let mut inserted = Vec::with_capacity(products.len());
  for input in products {
    let product = store
      .add_product(input)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    info!(id = product.id, name = %product.name, stock = product.stock, "seeded product");
    inserted.push(product);
  }
  Ok(inserted)
}

// ─── Integration tests ────────────────────────────────────────────────────────
