//! Decoding helpers between SQLite column values and the core row types.
//!
//! Dates are stored as `YYYY-MM-DD` text. A blank date is read as null, the
//! same as SQL `NULL`.

use chrono::NaiveDate;
use salesboard_core::model::{Customer, SalesFact};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn decode_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  match s.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
      .map(Some)
      .map_err(|e| Error::DateParse(format!("{s:?}: {e}"))),
  }
}

#[cfg(test)]
pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `fact_sales` row.
pub struct RawSalesFact {
  pub order_number: String,
  pub order_date:   Option<String>,
  pub customer_key: i64,
  pub product_key:  i64,
  pub quantity:     Option<i64>,
  pub price:        Option<f64>,
  pub sales_amount: Option<f64>,
}

impl RawSalesFact {
  pub fn into_fact(self) -> Result<SalesFact> {
    Ok(SalesFact {
      order_number: self.order_number,
      order_date:   decode_date(self.order_date.as_deref())?,
      customer_key: self.customer_key,
      product_key:  self.product_key,
      quantity:     self.quantity,
      price:        self.price,
      sales_amount: self.sales_amount,
    })
  }
}

/// Raw values read directly from a `dim_customers` row.
pub struct RawCustomer {
  pub customer_key:    i64,
  pub customer_number: String,
  pub first_name:      String,
  pub last_name:       String,
  pub country:         Option<String>,
  pub gender:          Option<String>,
  pub birthdate:       Option<String>,
}

impl RawCustomer {
  pub fn into_customer(self) -> Result<Customer> {
    Ok(Customer {
      customer_key:    self.customer_key,
      customer_number: self.customer_number,
      first_name:      self.first_name,
      last_name:       self.last_name,
      birthdate:       decode_date(self.birthdate.as_deref())?,
      gender:          self.gender,
      country:         self.country,
    })
  }
}
