//! Handlers for `/products` endpoints.
//!
//! | Method | Path                   | Notes |
//! |--------|------------------------|-------|
//! | `GET`  | `/products`            | Filter, search, sort, paginate |
//! | `GET`  | `/products/search`     | Same as the listing, name filter in `q` |
//! | `GET`  | `/products/categories` | Product count per category |
//! | `GET`  | `/products/:id`        | Single product |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
};
use serde::Deserialize;
use storefront_core::{
  product::{Category, CategoryCount, Product},
  store::{Pagination, ProductQuery, SortOrder, StorefrontStore},
};
use tracing::debug;

use crate::{ApiState, Envelope, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Catalog query string. Every field is read leniently: malformed paging
/// falls back to the defaults and an unknown category matches nothing.
#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// A category name; empty or `all` means no filter.
  pub category: Option<String>,
  /// Sort key; unrecognised keys fall back to newest first.
  pub sort:     Option<String>,
  /// Case-insensitive substring of the product name.
  pub search:   Option<String>,
  pub page:     Option<String>,
  pub limit:    Option<String>,
}

/// What a catalog query string asks for.
#[derive(Debug, PartialEq, Eq)]
enum Listing {
  Query(ProductQuery),
  /// The category names nothing in the catalog; the page is empty.
  NoMatch { page: u32, limit: u32 },
}

/// A positive integer, or `None` for anything else.
fn positive(raw: Option<&str>) -> Option<u32> {
  raw?.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

impl ListParams {
  fn into_listing(self) -> Listing {
    let page = positive(self.page.as_deref()).unwrap_or(1);
    let limit = positive(self.limit.as_deref())
      .map(|l| l.min(ProductQuery::MAX_LIMIT))
      .unwrap_or(ProductQuery::DEFAULT_LIMIT);

    let category = match self.category.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(name) if name.eq_ignore_ascii_case("all") => None,
      Some(name) => match Category::parse(&name.to_ascii_lowercase()) {
        Ok(category) => Some(category),
        Err(_) => return Listing::NoMatch { page, limit },
      },
    };

    let search = self
      .search
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty());

    let sort = self
      .sort
      .as_deref()
      .map(SortOrder::parse_lenient)
      .unwrap_or_default();

    Listing::Query(ProductQuery { category, search, sort, page, limit })
  }
}

async fn list_page<S>(
  state: &ApiState<S>,
  listing: Listing,
) -> Result<Json<Envelope<Vec<Product>>>, ApiError>
where
  S: StorefrontStore + 'static,
{
  let query = match listing {
    Listing::Query(query) => query,
    Listing::NoMatch { page, limit } => {
      debug!(page, limit, "unknown category matches no products");
      return Ok(Json(
        Envelope::ok(Vec::new()).with_pagination(Pagination::new(page, limit, 0)),
      ));
    }
  };

  let page = state
    .store
    .list_products(&query)
    .await
    .map_err(|e| state.store_error(e))?;
  debug!(
    category = ?query.category,
    sort = ?query.sort,
    page = query.page,
    returned = page.products.len(),
    total = page.pagination.total,
    "listed products"
  );

  Ok(Json(Envelope::ok(page.products).with_pagination(page.pagination)))
}

/// `GET /products[?category=...][&search=...][&sort=...][&page=...][&limit=...]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Product>>>, ApiError>
where
  S: StorefrontStore + 'static,
{
  let Query(params) = params?;
  list_page(&state, params.into_listing()).await
}

// ─── Search ───────────────────────────────────────────────────────────────────

/// `/products/search` takes the name filter as `q`.
#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q:    Option<String>,
  #[serde(flatten)]
  pub list: ListParams,
}

/// `GET /products/search?q=...`; the other listing params apply as well.
pub async fn search<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Product>>>, ApiError>
where
  S: StorefrontStore + 'static,
{
  let Query(SearchParams { q, mut list }) = params?;
  list.search = q.or(list.search);
  list_page(&state, list.into_listing()).await
}

// ─── Categories ───────────────────────────────────────────────────────────────

/// `GET /products/categories`
pub async fn categories<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Vec<CategoryCount>>>, ApiError>
where
  S: StorefrontStore + 'static,
{
  let counts = state
    .store
    .category_counts()
    .await
    .map_err(|e| state.store_error(e))?;
  Ok(Json(Envelope::ok(counts)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /products/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Envelope<Product>>, ApiError>
where
  S: StorefrontStore + 'static,
{
  let Path(id) = path?;
  let product = state
    .store
    .get_product(id)
    .await
    .map_err(|e| state.store_error(e))?
    .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
  Ok(Json(Envelope::ok(product)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(category: Option<&str>, page: Option<&str>, limit: Option<&str>) -> ListParams {
    ListParams {
      category: category.map(str::to_owned),
      page: page.map(str::to_owned),
      limit: limit.map(str::to_owned),
      ..Default::default()
    }
  }

  fn query(listing: Listing) -> ProductQuery {
    match listing {
      Listing::Query(q) => q,
      other => panic!("expected a store query, got {other:?}"),
    }
  }

  #[test]
  fn defaults_apply_when_params_are_absent() {
    assert_eq!(query(ListParams::default().into_listing()), ProductQuery::default());
  }

  #[test]
  fn all_and_empty_category_mean_no_filter() {
    assert_eq!(query(params(Some("all"), None, None).into_listing()).category, None);
    assert_eq!(query(params(Some(""), None, None).into_listing()).category, None);
    assert_eq!(
      query(params(Some("Kids"), None, None).into_listing()).category,
      Some(Category::Kids)
    );
  }

  #[test]
  fn malformed_paging_falls_back_to_defaults() {
    for (page, limit) in [("0", "0"), ("abc", "-3"), ("", "ten")] {
      let q = query(params(None, Some(page), Some(limit)).into_listing());
      assert_eq!((q.page, q.limit), (1, ProductQuery::DEFAULT_LIMIT), "{page} {limit}");
    }
  }

  #[test]
  fn oversized_limit_is_clamped() {
    let q = query(params(None, Some("3"), Some("500")).into_listing());
    assert_eq!(q.page, 3);
    assert_eq!(q.limit, ProductQuery::MAX_LIMIT);
  }

  #[test]
  fn unknown_category_matches_nothing() {
    assert_eq!(
      params(Some("boxers"), Some("2"), None).into_listing(),
      Listing::NoMatch { page: 2, limit: ProductQuery::DEFAULT_LIMIT }
    );
  }

  #[test]
  fn unknown_sort_falls_back_to_newest() {
    let q = query(ListParams { sort: Some("featured".into()), ..Default::default() }.into_listing());
    assert_eq!(q.sort, SortOrder::Newest);
  }
}
