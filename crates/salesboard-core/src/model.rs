//! Row types for the star schema: one fact table and two dimensions.
//!
//! Rows are immutable once loaded. Engines never write back; they only scan
//! and aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Surrogate key of a row in `dim_customers`.
pub type CustomerKey = i64;

/// Surrogate key of a row in `dim_products`.
pub type ProductKey = i64;

// ─── Fact ────────────────────────────────────────────────────────────────────

/// One order line from `fact_sales`.
///
/// Measures are optional so a null in the source survives loading; engines
/// skip null measures instead of treating them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFact {
  pub order_number: String,
  pub order_date:   Option<NaiveDate>,
  /// May reference a customer that is absent from the dimension table.
  pub customer_key: CustomerKey,
  /// May reference a product that is absent from the dimension table.
  pub product_key:  ProductKey,
  pub quantity:     Option<i64>,
  pub price:        Option<f64>,
  pub sales_amount: Option<f64>,
}

impl SalesFact {
  /// Convenience constructor for a fully-populated order line.
  pub fn new(
    order_number: impl Into<String>,
    order_date: NaiveDate,
    customer_key: CustomerKey,
    product_key: ProductKey,
    quantity: i64,
    price: f64,
  ) -> Self {
    Self {
      order_number: order_number.into(),
      order_date: Some(order_date),
      customer_key,
      product_key,
      quantity: Some(quantity),
      price: Some(price),
      sales_amount: Some(quantity as f64 * price),
    }
  }
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A row of `dim_customers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub customer_key:    CustomerKey,
  /// Business identifier, e.g. `AW00011000`.
  pub customer_number: String,
  pub first_name:      String,
  pub last_name:       String,
  pub birthdate:       Option<NaiveDate>,
  pub gender:          Option<String>,
  pub country:         Option<String>,
}

impl Customer {
  /// `first_name last_name`, trimmed when either part is blank.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_owned()
  }
}

/// A row of `dim_products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub product_key:    ProductKey,
  pub product_number: String,
  pub product_name:   String,
  pub category:       Option<String>,
  pub subcategory:    Option<String>,
  pub cost:           f64,
}
