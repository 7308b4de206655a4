//! [`SqliteStore`]: the SQLite implementation of [`StorefrontStore`].
//!
//! Every cart mutation runs as one `BEGIN IMMEDIATE` transaction on the
//! connection thread: the write lock is taken before stock is read, stock is
//! debited with a conditional `UPDATE`, and the transaction rolls back when
//! dropped on any early return.

use std::{collections::HashMap, path::Path};

use chrono::{SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use storefront_core::{
  cart::{CartItem, CartItemId, CartLine},
  product::{Category, CategoryCount, NewProduct, Product, ProductId},
  reconcile::{self, CartWrite},
  session::SessionId,
  store::{Pagination, ProductPage, ProductQuery, SortOrder, StorefrontStore},
};

use crate::{
  Error, Result,
  encode::{
    CART_ITEM_COLUMNS, PRODUCT_COLUMNS, RawCartItem, RawCartLine, RawProduct,
    decode_category, encode_category, encode_dt, encode_price,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A storefront store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers (run on the connection thread) ────────────────────────

fn immediate(conn: &mut rusqlite::Connection) -> Result<rusqlite::Transaction<'_>> {
  Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn product_stock(conn: &rusqlite::Connection, id: ProductId) -> Result<Option<u32>> {
  Ok(
    conn
      .query_row("SELECT stock FROM products WHERE id = ?1", [id], |r| r.get(0))
      .optional()?,
  )
}

fn item_by_id(
  conn: &rusqlite::Connection,
  session: &SessionId,
  id: CartItemId,
) -> Result<Option<CartItem>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = ?1 AND session_id = ?2"
      ),
      rusqlite::params![id, session.as_str()],
      RawCartItem::from_row,
    )
    .optional()?;
  raw.map(RawCartItem::into_item).transpose()
}

fn item_by_product(
  conn: &rusqlite::Connection,
  session: &SessionId,
  product_id: ProductId,
) -> Result<Option<CartItem>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {CART_ITEM_COLUMNS} FROM cart_items
         WHERE session_id = ?1 AND product_id = ?2"
      ),
      rusqlite::params![session.as_str(), product_id],
      RawCartItem::from_row,
    )
    .optional()?;
  raw.map(RawCartItem::into_item).transpose()
}

fn session_items(conn: &rusqlite::Connection, session: &SessionId) -> Result<Vec<CartItem>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE session_id = ?1 ORDER BY id"
  ))?;
  let raws = stmt
    .query_map([session.as_str()], RawCartItem::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCartItem::into_item).collect()
}

/// Subtract `delta` units from stock; a negative `delta` adds units back.
///
/// The update only applies when the result stays non-negative, so two
/// writers racing for the last unit cannot both succeed.
fn take_stock(conn: &rusqlite::Connection, product_id: ProductId, delta: i64) -> Result<()> {
  let changed = conn.execute(
    "UPDATE products SET stock = stock - ?2 WHERE id = ?1 AND stock - ?2 >= 0",
    rusqlite::params![product_id, delta],
  )?;
  if changed == 1 {
    return Ok(());
  }
  match product_stock(conn, product_id)? {
    None => Err(storefront_core::Error::ProductNotFound(product_id).into()),
    Some(available) => Err(
      storefront_core::Error::OutOfStock {
        product_id,
        requested: u32::try_from(delta).unwrap_or(u32::MAX),
        available,
      }
      .into(),
    ),
  }
}

fn return_stock(conn: &rusqlite::Connection, product_id: ProductId, units: u64) -> Result<()> {
  let units = i64::try_from(units)
    .map_err(|_| Error::Corrupt(format!("restock of {units} units overflows")))?;
  take_stock(conn, product_id, -units)
}

fn add_item_tx(
  conn: &mut rusqlite::Connection,
  session: &SessionId,
  product_id: ProductId,
  quantity: u32,
) -> Result<CartItem> {
  let tx = immediate(conn)?;

  let available = product_stock(&tx, product_id)?
    .ok_or(storefront_core::Error::ProductNotFound(product_id))?;
  let existing = item_by_product(&tx, session, product_id)?;
  let plan = reconcile::plan_add(product_id, available, existing.as_ref(), quantity)?;

  take_stock(&tx, product_id, i64::from(plan.debit))?;

  let now = encode_dt(Utc::now());
  let item_id = match plan.write {
    CartWrite::Insert { quantity } => {
      tx.execute(
        "INSERT INTO cart_items (session_id, product_id, quantity, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![session.as_str(), product_id, quantity, now],
      )?;
      tx.last_insert_rowid()
    }
    CartWrite::Update { item_id, quantity } => {
      tx.execute(
        "UPDATE cart_items SET quantity = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![quantity, now, item_id],
      )?;
      item_id
    }
  };

  let item = item_by_id(&tx, session, item_id)?
    .ok_or(storefront_core::Error::CartItemNotFound(item_id))?;
  tx.commit()?;
  Ok(item)
}

fn set_quantity_tx(
  conn: &mut rusqlite::Connection,
  session: &SessionId,
  item_id: CartItemId,
  quantity: u32,
) -> Result<CartItem> {
  let tx = immediate(conn)?;

  let item = item_by_id(&tx, session, item_id)?
    .ok_or(storefront_core::Error::CartItemNotFound(item_id))?;
  let available = product_stock(&tx, item.product_id)?
    .ok_or(storefront_core::Error::ProductNotFound(item.product_id))?;
  let plan = reconcile::plan_set_quantity(&item, available, quantity)?;

  tx.execute(
    "UPDATE cart_items SET quantity = ?1, updated_at = ?2
     WHERE id = ?3 AND session_id = ?4",
    rusqlite::params![plan.quantity, encode_dt(Utc::now()), item_id, session.as_str()],
  )?;
  if !plan.leaves_stock_unchanged() {
    take_stock(&tx, item.product_id, plan.stock_delta)?;
  }

  let updated = item_by_id(&tx, session, item_id)?
    .ok_or(storefront_core::Error::CartItemNotFound(item_id))?;
  tx.commit()?;
  Ok(updated)
}

fn remove_item_tx(
  conn: &mut rusqlite::Connection,
  session: &SessionId,
  item_id: CartItemId,
) -> Result<CartItem> {
  let tx = immediate(conn)?;

  let item = item_by_id(&tx, session, item_id)?
    .ok_or(storefront_core::Error::CartItemNotFound(item_id))?;

  tx.execute(
    "DELETE FROM cart_items WHERE id = ?1 AND session_id = ?2",
    rusqlite::params![item_id, session.as_str()],
  )?;
  for restock in reconcile::plan_restock([&item]) {
    return_stock(&tx, restock.product_id, restock.quantity)?;
  }

  tx.commit()?;
  Ok(item)
}

fn clear_cart_tx(
  conn: &mut rusqlite::Connection,
  session: &SessionId,
) -> Result<Vec<CartItem>> {
  let tx = immediate(conn)?;

  let items = session_items(&tx, session)?;
  for restock in reconcile::plan_restock(&items) {
    return_stock(&tx, restock.product_id, restock.quantity)?;
  }
  tx.execute("DELETE FROM cart_items WHERE session_id = ?1", [session.as_str()])?;

  tx.commit()?;
  Ok(items)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
fn like_pattern(search: &str) -> String {
  let mut escaped = String::with_capacity(search.len() + 2);
  escaped.push('%');
  for ch in search.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

fn order_clause(sort: SortOrder) -> &'static str {
  match sort {
    SortOrder::PriceAsc => "CAST(price AS REAL) ASC, id ASC",
    SortOrder::PriceDesc => "CAST(price AS REAL) DESC, id DESC",
    SortOrder::NameAsc => "name COLLATE NOCASE ASC, id ASC",
    SortOrder::NameDesc => "name COLLATE NOCASE DESC, id DESC",
    SortOrder::Newest => "created_at DESC, id DESC",
  }
}

// ─── StorefrontStore impl ────────────────────────────────────────────────────

impl StorefrontStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
    let category = query.category.map(encode_category);
    let pattern = query
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(like_pattern);
    let order = order_clause(query.sort);
    let limit = i64::from(query.limit);
    let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawProduct>, u64) = self
      .conn
      .call(move |conn| {
        // ?1 and ?2 are NULL when their filter is absent.
        let filter = "(?1 IS NULL OR category = ?1)
                      AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\')";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM products WHERE {filter}"),
          rusqlite::params![category, pattern],
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {PRODUCT_COLUMNS} FROM products
           WHERE {filter}
           ORDER BY {order}
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![category, pattern, limit, offset],
            RawProduct::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, u64::try_from(total).unwrap_or(0)))
      })
      .await?;

    let products = raws
      .into_iter()
      .map(RawProduct::into_product)
      .collect::<Result<Vec<_>>>()?;

    Ok(ProductPage {
      products,
      pagination: Pagination::new(query.page, query.limit, total),
    })
  }

  async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
              [id],
              RawProduct::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT category, COUNT(*) FROM products GROUP BY category")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts: HashMap<Category, u64> = HashMap::new();
    for (category, count) in rows {
      counts.insert(decode_category(&category)?, u64::try_from(count).unwrap_or(0));
    }

    Ok(
      Category::all()
        .map(|category| CategoryCount {
          category,
          count: counts.get(&category).copied().unwrap_or(0),
        })
        .collect(),
    )
  }

  async fn add_product(&self, input: NewProduct) -> Result<Product> {
    input.validate()?;

    // Truncated to the stored precision so the returned value matches reads.
    let created_at = Utc::now().trunc_subsecs(6);
    let price_str = encode_price(input.price);
    let category_str = encode_category(input.category);
    let at_str = encode_dt(created_at);
    let row = input.clone();

    let id: ProductId = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products
             (name, price, description, category, image_url, stock, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.name,
            price_str,
            row.description,
            category_str,
            row.image_url,
            row.stock,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Product {
      id,
      name: input.name,
      price: input.price,
      description: input.description,
      category: input.category,
      image_url: input.image_url,
      stock: input.stock,
      created_at,
    })
  }

  // ── Cart reads ────────────────────────────────────────────────────────────

  async fn cart_lines(&self, session: &SessionId) -> Result<Vec<CartLine>> {
    let session_str = session.as_str().to_owned();

    let raws: Vec<RawCartLine> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ci.id, ci.product_id, ci.quantity, p.name, p.price, p.image_url
           FROM cart_items ci
           JOIN products p ON ci.product_id = p.id
           WHERE ci.session_id = ?1
           ORDER BY ci.created_at DESC, ci.id DESC",
        )?;
        let rows = stmt
          .query_map([session_str], |row| {
            Ok(RawCartLine {
              id:         row.get(0)?,
              product_id: row.get(1)?,
              quantity:   row.get(2)?,
              name:       row.get(3)?,
              price:      row.get(4)?,
              image_url:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCartLine::into_line).collect()
  }

  // ── Cart mutations ────────────────────────────────────────────────────────

  async fn add_item(
    &self,
    session: &SessionId,
    product_id: ProductId,
    quantity: u32,
  ) -> Result<CartItem> {
    let session = session.clone();
    self
      .conn
      .call(move |conn| Ok(add_item_tx(conn, &session, product_id, quantity)))
      .await?
  }

  async fn set_quantity(
    &self,
    session: &SessionId,
    item_id: CartItemId,
    quantity: u32,
  ) -> Result<CartItem> {
    let session = session.clone();
    self
      .conn
      .call(move |conn| Ok(set_quantity_tx(conn, &session, item_id, quantity)))
      .await?
  }

  async fn remove_item(&self, session: &SessionId, item_id: CartItemId) -> Result<CartItem> {
    let session = session.clone();
    self
      .conn
      .call(move |conn| Ok(remove_item_tx(conn, &session, item_id)))
      .await?
  }

  async fn clear_cart(&self, session: &SessionId) -> Result<Vec<CartItem>> {
    let session = session.clone();
    self
      .conn
      .call(move |conn| Ok(clear_cart_tx(conn, &session)))
      .await?
  }
}
