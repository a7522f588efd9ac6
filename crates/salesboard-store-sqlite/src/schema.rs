//! SQL schema of the sales warehouse.
//!
//! Production warehouses are provisioned elsewhere; this DDL documents the
//! expected layout and backs the in-memory store used by tests.

/// Tables every warehouse must expose.
pub const TABLES: [&str; 3] = ["fact_sales", "dim_customers", "dim_products"];

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dim_customers (
    customer_key    INTEGER PRIMARY KEY,
    customer_number TEXT NOT NULL,
    first_name      TEXT NOT NULL DEFAULT '',
    last_name       TEXT NOT NULL DEFAULT '',
    country         TEXT,
    gender          TEXT,
    birthdate       TEXT             -- YYYY-MM-DD or NULL
);

CREATE TABLE IF NOT EXISTS dim_products (
    product_key    INTEGER PRIMARY KEY,
    product_number TEXT NOT NULL,
    product_name   TEXT NOT NULL,
    category       TEXT,
    subcategory    TEXT,
    cost           REAL NOT NULL DEFAULT 0
);

-- Keys are deliberately not foreign keys: a fact may reference a dimension
-- row that does not exist.
CREATE TABLE IF NOT EXISTS fact_sales (
    order_number TEXT NOT NULL,
    product_key  INTEGER NOT NULL,
    customer_key INTEGER NOT NULL,
    order_date   TEXT,               -- YYYY-MM-DD or NULL
    sales_amount REAL,
    quantity     INTEGER,
    price        REAL
);

CREATE INDEX IF NOT EXISTS fact_sales_date_idx     ON fact_sales(order_date);
CREATE INDEX IF NOT EXISTS fact_sales_customer_idx ON fact_sales(customer_key);
CREATE INDEX IF NOT EXISTS fact_sales_product_idx  ON fact_sales(product_key);
";
