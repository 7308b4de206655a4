//! Integration tests for `SqliteStore` against an in-memory database.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_core::{
  Error as CoreError, StoreError as _,
  product::{Category, NewProduct, Product},
  session::SessionId,
  store::{ProductQuery, SortOrder, StorefrontStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn session(id: &str) -> SessionId { SessionId::new(id).unwrap() }

fn new_product(name: &str, price: Decimal, category: Category, stock: u32) -> NewProduct {
  NewProduct {
    name: name.into(),
    price,
    description: format!("{name} description"),
    category,
    image_url: format!("https://img.example/{name}.jpg"),
    stock,
  }
}

async fn seed(s: &SqliteStore, name: &str, price: Decimal, stock: u32) -> Product {
  s.add_product(new_product(name, price, Category::Men, stock))
    .await
    .unwrap()
}

async fn stock_of(s: &SqliteStore, p: &Product) -> u32 {
  s.get_product(p.id).await.unwrap().unwrap().stock
}

fn domain(err: &crate::Error) -> CoreError {
  err.domain().cloned().expect("domain error")
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_product() {
  let s = store().await;
  let p = seed(&s, "boxer", dec!(349.50), 12).await;

  let fetched = s.get_product(p.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "boxer");
  assert_eq!(fetched.price, dec!(349.50));
  assert_eq!(fetched.category, Category::Men);
  assert_eq!(fetched.stock, 12);
  assert_eq!(fetched.created_at, p.created_at);
}

#[tokio::test]
async fn get_product_missing_returns_none() {
  let s = store().await;
  assert!(s.get_product(404).await.unwrap().is_none());
}

#[tokio::test]
async fn list_filters_by_category() {
  let s = store().await;
  s.add_product(new_product("brief", dec!(199), Category::Men, 5)).await.unwrap();
  s.add_product(new_product("camisole", dec!(299), Category::Women, 5)).await.unwrap();
  s.add_product(new_product("vest", dec!(149), Category::Men, 5)).await.unwrap();

  let query = ProductQuery { category: Some(Category::Men), ..Default::default() };
  let page = s.list_products(&query).await.unwrap();

  assert_eq!(page.products.len(), 2);
  assert!(page.products.iter().all(|p| p.category == Category::Men));
  assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn list_sorts_by_price_both_ways() {
  let s = store().await;
  for (name, price) in [("a", dec!(500)), ("b", dec!(99.99)), ("c", dec!(1200)), ("d", dec!(250))] {
    seed(&s, name, price, 1).await;
  }

  let asc = s
    .list_products(&ProductQuery { sort: SortOrder::PriceAsc, ..Default::default() })
    .await
    .unwrap();
  let prices: Vec<Decimal> = asc.products.iter().map(|p| p.price).collect();
  assert!(prices.windows(2).all(|w| w[0] <= w[1]), "{prices:?}");

  let desc = s
    .list_products(&ProductQuery { sort: SortOrder::PriceDesc, ..Default::default() })
    .await
    .unwrap();
  let prices: Vec<Decimal> = desc.products.iter().map(|p| p.price).collect();
  assert!(prices.windows(2).all(|w| w[0] >= w[1]), "{prices:?}");
}

#[tokio::test]
async fn list_defaults_to_newest_first() {
  let s = store().await;
  let first = seed(&s, "first", dec!(1), 1).await;
  let second = seed(&s, "second", dec!(1), 1).await;

  let page = s.list_products(&ProductQuery::default()).await.unwrap();
  let ids: Vec<i64> = page.products.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn list_search_is_case_insensitive_and_literal() {
  let s = store().await;
  seed(&s, "Cotton Trunk", dec!(1), 1).await;
  seed(&s, "Silk Boxer", dec!(1), 1).await;
  seed(&s, "100% Cotton Vest", dec!(1), 1).await;

  let cotton = s
    .list_products(&ProductQuery { search: Some("cotton".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(cotton.products.len(), 2);

  let percent = s
    .list_products(&ProductQuery { search: Some("100%".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(percent.products.len(), 1);
  assert_eq!(percent.products[0].name, "100% Cotton Vest");

  let underscore = s
    .list_products(&ProductQuery { search: Some("_".into()), ..Default::default() })
    .await
    .unwrap();
  assert!(underscore.products.is_empty());
}

#[tokio::test]
async fn list_total_counts_whole_matching_set() {
  let s = store().await;
  for i in 0..7 {
    seed(&s, &format!("item-{i}"), dec!(10), 1).await;
  }

  let query = ProductQuery { page: 2, limit: 3, ..Default::default() };
  let page = s.list_products(&query).await.unwrap();

  assert_eq!(page.products.len(), 3);
  assert_eq!(page.pagination.total, 7);
  assert_eq!(page.pagination.total_pages, 3);
  assert!(page.pagination.has_next);
  assert!(page.pagination.has_prev);

  let last = s
    .list_products(&ProductQuery { page: 3, limit: 3, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(last.products.len(), 1);
  assert!(!last.pagination.has_next);
}

#[tokio::test]
async fn negative_price_is_rejected_before_insert() {
  let s = store().await;
  let err = s
    .add_product(new_product("neg", dec!(-50), Category::Men, 5))
    .await
    .unwrap_err();
  assert_eq!(domain(&err), CoreError::NegativePrice(dec!(-50)));

  let page = s.list_products(&ProductQuery::default()).await.unwrap();
  assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn schema_refuses_negative_price_rows() {
  let s = store().await;
  let inserted = s
    .conn
    .call(|conn| {
      Ok(conn.execute(
        "INSERT INTO products (name, price, category, stock, created_at)
         VALUES ('neg', '-1.00', 'men', 1, '2024-01-01T00:00:00.000000Z')",
        [],
      ))
    })
    .await
    .unwrap();
  assert!(inserted.is_err());
}

#[tokio::test]
async fn category_counts_include_empty_categories() {
  let s = store().await;
  s.add_product(new_product("brief", dec!(1), Category::Men, 1)).await.unwrap();
  s.add_product(new_product("trunk", dec!(1), Category::Men, 1)).await.unwrap();
  s.add_product(new_product("tee", dec!(1), Category::Kids, 1)).await.unwrap();

  let counts = s.category_counts().await.unwrap();
  assert_eq!(counts.len(), 4);
  let count = |c| counts.iter().find(|cc| cc.category == c).unwrap().count;
  assert_eq!(count(Category::Men), 2);
  assert_eq!(count(Category::Kids), 1);
  assert_eq!(count(Category::Women), 0);
  assert_eq!(count(Category::Innerwear), 0);
}

// ─── Add ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_debits_stock_and_creates_item() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 10).await;
  let sid = session("s1");

  let item = s.add_item(&sid, p.id, 3).await.unwrap();
  assert_eq!(item.quantity, 3);
  assert_eq!(item.product_id, p.id);
  assert_eq!(item.session_id, sid);
  assert_eq!(stock_of(&s, &p).await, 7);
}

#[tokio::test]
async fn add_twice_merges_into_one_item() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 10).await;
  let sid = session("s1");

  let first = s.add_item(&sid, p.id, 2).await.unwrap();
  let second = s.add_item(&sid, p.id, 3).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(second.quantity, 5);
  assert_eq!(stock_of(&s, &p).await, 5);
  assert_eq!(s.cart_lines(&sid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_checks_only_the_increment_against_stock() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 4).await;
  let sid = session("s1");

  s.add_item(&sid, p.id, 3).await.unwrap();
  // 1 left: adding 1 more succeeds even though the item now holds 4.
  let item = s.add_item(&sid, p.id, 1).await.unwrap();
  assert_eq!(item.quantity, 4);
  assert_eq!(stock_of(&s, &p).await, 0);
}

#[tokio::test]
async fn add_out_of_stock_writes_nothing() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 2).await;
  let sid = session("s1");

  let err = s.add_item(&sid, p.id, 3).await.unwrap_err();
  assert_eq!(domain(&err), CoreError::OutOfStock {
    product_id: p.id,
    requested:  3,
    available:  2,
  });
  assert_eq!(stock_of(&s, &p).await, 2);
  assert!(s.cart_lines(&sid).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_unknown_product_errors() {
  let s = store().await;
  let err = s.add_item(&session("s1"), 999, 1).await.unwrap_err();
  assert_eq!(domain(&err), CoreError::ProductNotFound(999));
}

// ─── Set quantity ────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_quantity_moves_the_difference() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 10).await;
  let sid = session("s1");
  let item = s.add_item(&sid, p.id, 2).await.unwrap();

  let up = s.set_quantity(&sid, item.id, 6).await.unwrap();
  assert_eq!(up.quantity, 6);
  assert_eq!(stock_of(&s, &p).await, 4);

  let down = s.set_quantity(&sid, item.id, 1).await.unwrap();
  assert_eq!(down.quantity, 1);
  assert_eq!(stock_of(&s, &p).await, 9);

  let same = s.set_quantity(&sid, item.id, 1).await.unwrap();
  assert_eq!(same.quantity, 1);
  assert_eq!(stock_of(&s, &p).await, 9);
}

#[tokio::test]
async fn set_quantity_beyond_stock_writes_nothing() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 5).await;
  let sid = session("s1");
  let item = s.add_item(&sid, p.id, 2).await.unwrap();

  // 3 left in stock; raising to 6 needs 4 more.
  let err = s.set_quantity(&sid, item.id, 6).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::OutOfStock { requested: 4, available: 3, .. }));
  assert_eq!(stock_of(&s, &p).await, 3);
  assert_eq!(s.cart_lines(&sid).await.unwrap()[0].quantity, 2);
}

#[tokio::test]
async fn set_quantity_on_another_sessions_item_is_not_found() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 5).await;
  let item = s.add_item(&session("owner"), p.id, 2).await.unwrap();

  let err = s.set_quantity(&session("intruder"), item.id, 1).await.unwrap_err();
  assert_eq!(domain(&err), CoreError::CartItemNotFound(item.id));
  assert_eq!(stock_of(&s, &p).await, 3);
}

#[tokio::test]
async fn set_quantity_then_remove_restores_original_stock() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 8).await;
  let sid = session("s1");

  let item = s.add_item(&sid, p.id, 2).await.unwrap();
  s.set_quantity(&sid, item.id, 5).await.unwrap();
  s.remove_item(&sid, item.id).await.unwrap();

  assert_eq!(stock_of(&s, &p).await, 8);
  assert!(s.cart_lines(&sid).await.unwrap().is_empty());
}

// ─── Remove / clear ──────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_missing_item_errors() {
  let s = store().await;
  let err = s.remove_item(&session("s1"), 42).await.unwrap_err();
  assert_eq!(domain(&err), CoreError::CartItemNotFound(42));
}

#[tokio::test]
async fn remove_returns_the_removed_item() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 8).await;
  let sid = session("s1");
  let item = s.add_item(&sid, p.id, 3).await.unwrap();

  let removed = s.remove_item(&sid, item.id).await.unwrap();
  assert_eq!(removed.id, item.id);
  assert_eq!(removed.quantity, 3);
}

#[tokio::test]
async fn clear_restocks_every_product_and_empties_cart() {
  let s = store().await;
  let p1 = seed(&s, "brief", dec!(100), 10).await;
  let p2 = seed(&s, "vest", dec!(50), 4).await;
  let sid = session("s1");

  s.add_item(&sid, p1.id, 3).await.unwrap();
  s.add_item(&sid, p2.id, 4).await.unwrap();
  assert_eq!(stock_of(&s, &p2).await, 0);

  let removed = s.clear_cart(&sid).await.unwrap();
  assert_eq!(removed.len(), 2);
  assert_eq!(stock_of(&s, &p1).await, 10);
  assert_eq!(stock_of(&s, &p2).await, 4);
  assert!(s.cart_lines(&sid).await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_leaves_other_sessions_alone() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 10).await;
  s.add_item(&session("a"), p.id, 2).await.unwrap();
  s.add_item(&session("b"), p.id, 3).await.unwrap();

  s.clear_cart(&session("a")).await.unwrap();

  assert_eq!(stock_of(&s, &p).await, 7);
  assert_eq!(s.cart_lines(&session("b")).await.unwrap()[0].quantity, 3);
}

#[tokio::test]
async fn clear_empty_cart_is_a_no_op() {
  let s = store().await;
  assert!(s.clear_cart(&session("nobody")).await.unwrap().is_empty());
}

// ─── Cart lines ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn cart_lines_join_product_fields_newest_first() {
  let s = store().await;
  let p1 = seed(&s, "brief", dec!(100), 10).await;
  let p2 = seed(&s, "vest", dec!(49.99), 10).await;
  let sid = session("s1");

  s.add_item(&sid, p1.id, 2).await.unwrap();
  s.add_item(&sid, p2.id, 3).await.unwrap();

  let lines = s.cart_lines(&sid).await.unwrap();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0].product_id, p2.id);
  assert_eq!(lines[0].name, "vest");
  assert_eq!(lines[0].subtotal, dec!(149.97));
  assert_eq!(lines[1].product_id, p1.id);
  assert_eq!(lines[1].image_url, "https://img.example/brief.jpg");
}

// ─── Invariants ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn stock_plus_reservations_is_conserved() {
  let s = store().await;
  let p = seed(&s, "brief", dec!(100), 20).await;
  let (a, b) = (session("a"), session("b"));

  let ia = s.add_item(&a, p.id, 4).await.unwrap();
  let ib = s.add_item(&b, p.id, 6).await.unwrap();
  s.set_quantity(&a, ia.id, 9).await.unwrap();
  s.set_quantity(&b, ib.id, 2).await.unwrap();
  let _ = s.add_item(&a, p.id, 50).await.unwrap_err();

  let held_a: u32 = s.cart_lines(&a).await.unwrap().iter().map(|l| l.quantity).sum();
  let held_b: u32 = s.cart_lines(&b).await.unwrap().iter().map(|l| l.quantity).sum();
  assert_eq!(stock_of(&s, &p).await + held_a + held_b, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_last_unit_sell_exactly_one() {
  let s = store().await;
  let p = seed(&s, "last one", dec!(100), 1).await;

  let mut handles = Vec::new();
  for i in 0..8 {
    let s = s.clone();
    let product_id = p.id;
    handles.push(tokio::spawn(async move {
      s.add_item(&session(&format!("buyer-{i}")), product_id, 1).await
    }));
  }

  let mut successes = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => successes += 1,
      Err(e) => assert!(matches!(e.domain(), Some(CoreError::OutOfStock { .. }))),
    }
  }

  assert_eq!(successes, 1);
  assert_eq!(stock_of(&s, &p).await, 0);
}
