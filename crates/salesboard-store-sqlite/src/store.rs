//! [`SqliteWarehouse`], the SQLite implementation of [`SalesWarehouse`].

use std::path::Path;

use rusqlite::OpenFlags;
use salesboard_core::{
  SalesWarehouse,
  model::{Customer, Product, SalesFact},
};

use crate::{
  Error, Result,
  encode::{RawCustomer, RawSalesFact},
  schema::{SCHEMA, TABLES},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A populated sales warehouse in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open an existing warehouse at `path` read-only and check that the three
  /// star-schema tables are present.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_with_flags(
      path,
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;
    let warehouse = Self { conn };
    warehouse.check_tables().await?;
    Ok(warehouse)
  }

  /// Open an empty in-memory warehouse with the schema applied, for
  /// testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  async fn check_tables(&self) -> Result<()> {
    let present: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'view')")?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;

    match TABLES.into_iter().find(|t| !present.iter().any(|p| p == t)) {
      Some(missing) => Err(Error::MissingTable(missing)),
      None => Ok(()),
    }
  }
}

// ─── SalesWarehouse impl ─────────────────────────────────────────────────────

impl SalesWarehouse for SqliteWarehouse {
  type Error = Error;

  async fn sales(&self) -> Result<Vec<SalesFact>> {
    let raws: Vec<RawSalesFact> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT order_number, order_date, customer_key, product_key,
                  quantity, price, sales_amount
           FROM fact_sales",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSalesFact {
              order_number: row.get(0)?,
              order_date:   row.get(1)?,
              customer_key: row.get(2)?,
              product_key:  row.get(3)?,
              quantity:     row.get(4)?,
              price:        row.get(5)?,
              sales_amount: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = raws.len(), "fact_sales loaded");
    raws.into_iter().map(RawSalesFact::into_fact).collect()
  }

  async fn customers(&self) -> Result<Vec<Customer>> {
    let raws: Vec<RawCustomer> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT customer_key, customer_number, first_name, last_name,
                  country, gender, birthdate
           FROM dim_customers",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCustomer {
              customer_key:    row.get(0)?,
              customer_number: row.get(1)?,
              first_name:      row.get(2)?,
              last_name:       row.get(3)?,
              country:         row.get(4)?,
              gender:          row.get(5)?,
              birthdate:       row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = raws.len(), "dim_customers loaded");
    raws.into_iter().map(RawCustomer::into_customer).collect()
  }

  async fn products(&self) -> Result<Vec<Product>> {
    let products: Vec<Product> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT product_key, product_number, product_name,
                  category, subcategory, cost
           FROM dim_products",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Product {
              product_key:    row.get(0)?,
              product_number: row.get(1)?,
              product_name:   row.get(2)?,
              category:       row.get(3)?,
              subcategory:    row.get(4)?,
              cost:           row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = products.len(), "dim_products loaded");
    Ok(products)
  }
}
