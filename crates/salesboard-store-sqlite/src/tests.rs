//! Integration tests for `SqliteWarehouse` against in-memory and on-disk
//! databases.

use chrono::NaiveDate;
use salesboard_core::{SalesWarehouse, load_dataset};

use crate::{Error, SqliteWarehouse, encode::encode_date, schema::SCHEMA};

async fn warehouse() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

async fn seed(w: &SqliteWarehouse, sql: &'static str) {
  w.conn
    .call(move |conn| {
      conn.execute_batch(sql)?;
      Ok(())
    })
    .await
    .expect("seed statements");
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

const RETAIL: &str = "
INSERT INTO dim_customers VALUES
  (1, 'AW00001', 'Ada',  'Lovelace', 'Germany', 'Female', '1990-04-12'),
  (2, 'AW00002', 'Alan', 'Turing',   'France',  'Male',   NULL);

INSERT INTO dim_products VALUES
  (10, 'BK-R150', 'Road-150', 'Bikes',       'Road Bikes', 1500.0),
  (20, 'AC-H01',  'Helmet',   'Accessories', 'Helmets',    30.0);

INSERT INTO fact_sales VALUES
  ('SO1', 10, 1, '2022-03-04', 1200.0, 1, 1200.0),
  ('SO2', 20, 2, '2022-11-20',   40.0, 2,   20.0),
  ('SO3', 20, 1, '2023-01-15',   60.0, 3,   20.0);
";

// ─── Loading ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_warehouse_loads_empty_dataset() {
  let w = warehouse().await;
  let ds = load_dataset(&w).await.unwrap();
  assert!(ds.sales().is_empty());
  assert!(ds.customers().is_empty());
  assert!(ds.products().is_empty());
}

#[tokio::test]
async fn loads_all_three_tables() {
  let w = warehouse().await;
  seed(&w, RETAIL).await;

  let ds = load_dataset(&w).await.unwrap();
  assert_eq!(ds.sales().len(), 3);
  assert_eq!(ds.customers().len(), 2);
  assert_eq!(ds.products().len(), 2);

  let ada = ds.customer(1).expect("customer 1");
  assert_eq!(ada.full_name(), "Ada Lovelace");
  assert_eq!(ada.country.as_deref(), Some("Germany"));
  assert_eq!(ada.birthdate, Some(date(1990, 4, 12)));
  assert_eq!(ds.customer(2).unwrap().birthdate, None);

  let bike = ds.product(10).expect("product 10");
  assert_eq!(bike.category.as_deref(), Some("Bikes"));
  assert_eq!(bike.cost, 1500.0);
}

#[tokio::test]
async fn fact_columns_map_to_fields() {
  let w = warehouse().await;
  seed(&w, RETAIL).await;

  let mut sales = w.sales().await.unwrap();
  sales.sort_by(|a, b| a.order_number.cmp(&b.order_number));
  let so2 = &sales[1];
  assert_eq!(so2.order_number, "SO2");
  assert_eq!(so2.order_date, Some(date(2022, 11, 20)));
  assert_eq!(so2.customer_key, 2);
  assert_eq!(so2.product_key, 20);
  assert_eq!(so2.quantity, Some(2));
  assert_eq!(so2.price, Some(20.0));
  assert_eq!(so2.sales_amount, Some(40.0));
}

#[tokio::test]
async fn null_and_blank_dates_decode_to_none() {
  let w = warehouse().await;
  seed(
    &w,
    "INSERT INTO fact_sales VALUES
       ('SO1', 1, 1, NULL, 10.0, 1, 10.0),
       ('SO2', 1, 1, '',   20.0, 1, 20.0),
       ('SO3', 1, 1, '  ', 30.0, 1, 30.0);",
  )
  .await;

  let sales = w.sales().await.unwrap();
  assert_eq!(sales.len(), 3);
  assert!(sales.iter().all(|f| f.order_date.is_none()));
}

#[tokio::test]
async fn null_measures_stay_null() {
  let w = warehouse().await;
  seed(
    &w,
    "INSERT INTO fact_sales VALUES ('SO1', 1, 1, '2024-01-01', NULL, NULL, NULL);",
  )
  .await;

  let sales = w.sales().await.unwrap();
  assert_eq!(sales[0].sales_amount, None);
  assert_eq!(sales[0].quantity, None);
  assert_eq!(sales[0].price, None);
}

#[tokio::test]
async fn unmatched_keys_are_kept() {
  let w = warehouse().await;
  seed(
    &w,
    "INSERT INTO fact_sales VALUES ('SO9', 404, 505, '2024-05-05', 9.0, 1, 9.0);",
  )
  .await;

  let ds = load_dataset(&w).await.unwrap();
  assert_eq!(ds.sales().len(), 1);
  let joined: Vec<_> = ds.joined().collect();
  assert!(joined[0].customer.is_none());
  assert!(joined[0].product.is_none());
}

#[tokio::test]
async fn malformed_date_is_an_error() {
  let w = warehouse().await;
  seed(
    &w,
    "INSERT INTO fact_sales VALUES ('SO1', 1, 1, '04/03/2022', 1.0, 1, 1.0);",
  )
  .await;

  let err = w.sales().await.unwrap_err();
  assert!(matches!(err, Error::DateParse(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_birthdate_is_an_error() {
  let w = warehouse().await;
  seed(
    &w,
    "INSERT INTO dim_customers VALUES (1, 'AW1', 'A', 'B', NULL, NULL, '1990-13-40');",
  )
  .await;

  assert!(matches!(load_dataset(&w).await, Err(Error::DateParse(_))));
}

// ─── Opening files ───────────────────────────────────────────────────────────

#[tokio::test]
async fn open_reads_a_provisioned_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("provisioned.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
      .execute(
        "INSERT INTO fact_sales VALUES ('SO1', 1, 1, ?1, 5.0, 1, 5.0)",
        [encode_date(date(2021, 7, 9))],
      )
      .unwrap();
  }

  let w = SqliteWarehouse::open(&path).await.unwrap();
  let sales = w.sales().await.unwrap();
  assert_eq!(sales[0].order_date, Some(date(2021, 7, 9)));
}

#[tokio::test]
async fn open_rejects_a_file_without_the_star_schema() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("partial.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch("CREATE TABLE fact_sales (order_number TEXT);")
      .unwrap();
  }

  let err = SqliteWarehouse::open(&path).await.err().expect("missing tables");
  assert!(matches!(err, Error::MissingTable("dim_customers")), "got {err:?}");
}

#[tokio::test]
async fn open_missing_file_fails() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("absent.db");
  assert!(matches!(
    SqliteWarehouse::open(&path).await,
    Err(Error::Database(_))
  ));
}
