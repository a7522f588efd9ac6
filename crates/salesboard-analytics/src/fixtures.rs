//! Small builders shared by the engine tests.

use chrono::NaiveDate;
use salesboard_core::{
  Dataset,
  model::{Customer, CustomerKey, Product, ProductKey, SalesFact},
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A single-unit order line whose price equals its amount.
pub fn sale(
  order: &str,
  on: NaiveDate,
  customer_key: CustomerKey,
  product_key: ProductKey,
  amount: f64,
) -> SalesFact {
  SalesFact::new(order, on, customer_key, product_key, 1, amount)
}

pub fn customer(key: CustomerKey, country: &str, gender: &str) -> Customer {
  Customer {
    customer_key:    key,
    customer_number: format!("AW{key:08}"),
    first_name:      format!("First{key}"),
    last_name:       format!("Last{key}"),
    birthdate:       None,
    gender:          Some(gender.into()),
    country:         Some(country.into()),
  }
}

pub fn product(key: ProductKey, name: &str, category: &str, cost: f64) -> Product {
  Product {
    product_key:    key,
    product_number: format!("PN-{key}"),
    product_name:   name.into(),
    category:       Some(category.into()),
    subcategory:    None,
    cost,
  }
}

pub fn dataset(
  sales: Vec<SalesFact>,
  customers: Vec<Customer>,
  products: Vec<Product>,
) -> Dataset {
  Dataset::new(sales, customers, products).expect("valid fixture")
}

/// Two customers, three products, facts spread over 2022-2024.
pub fn retail() -> Dataset {
  dataset(
    vec![
      sale("SO1", date(2022, 3, 4), 1, 10, 1200.0),
      sale("SO2", date(2022, 11, 20), 2, 20, 40.0),
      sale("SO3", date(2023, 1, 15), 1, 20, 60.0),
      sale("SO3", date(2023, 1, 15), 1, 30, 25.0),
      sale("SO4", date(2023, 8, 2), 2, 10, 1300.0),
      sale("SO5", date(2024, 2, 29), 1, 10, 4000.0),
    ],
    vec![
      customer(1, "Germany", "Female"),
      customer(2, "France", "Male"),
    ],
    vec![
      product(10, "Road-150", "Bikes", 1500.0),
      product(20, "Helmet", "Accessories", 30.0),
      product(30, "Bottle", "Accessories", 4.0),
    ],
  )
}
