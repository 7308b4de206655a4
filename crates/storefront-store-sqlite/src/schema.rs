//! SQL schema for the storefront SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS products (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    price       TEXT    NOT NULL             -- decimal string, e.g. '499.99'
                CHECK (CAST(price AS REAL) >= 0),
    description TEXT    NOT NULL DEFAULT '',
    category    TEXT    NOT NULL
                CHECK (category IN ('innerwear', 'men', 'women', 'kids')),
    image_url   TEXT    NOT NULL DEFAULT '',
    stock       INTEGER NOT NULL CHECK (stock >= 0),
    created_at  TEXT    NOT NULL             -- RFC 3339 UTC, fixed width
);

-- One row per (session, product). Rows are deleted when removed or cleared.
CREATE TABLE IF NOT EXISTS cart_items (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT    NOT NULL,
    product_id  INTEGER NOT NULL REFERENCES products(id),
    quantity    INTEGER NOT NULL CHECK (quantity >= 1),
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL,
    UNIQUE (session_id, product_id)
);

CREATE INDEX IF NOT EXISTS products_category_idx   ON products(category);
CREATE INDEX IF NOT EXISTS products_created_idx    ON products(created_at);
CREATE INDEX IF NOT EXISTS cart_items_session_idx  ON cart_items(session_id);

PRAGMA user_version = 1;
";
