//! The loaded star schema and its left-join view.
//!
//! A [`Dataset`] owns every row of the three tables and indexes both
//! dimensions by key once, at construction. Facts are joined lazily: a fact
//! whose key has no dimension row is kept and carries `None` for that side.

use std::collections::HashMap;

use crate::{
  Error, Result,
  model::{Customer, CustomerKey, Product, ProductKey, SalesFact},
};

/// The fact table plus both dimension tables, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
  sales:        Vec<SalesFact>,
  customers:    Vec<Customer>,
  products:     Vec<Product>,
  customer_idx: HashMap<CustomerKey, usize>,
  product_idx:  HashMap<ProductKey, usize>,
}

/// A fact row left-joined to its customer and product.
#[derive(Debug, Clone, Copy)]
pub struct JoinedSale<'a> {
  pub fact:     &'a SalesFact,
  pub customer: Option<&'a Customer>,
  pub product:  Option<&'a Product>,
}

impl Dataset {
  /// Build a dataset, rejecting dimension tables with repeated keys.
  pub fn new(
    sales: Vec<SalesFact>,
    customers: Vec<Customer>,
    products: Vec<Product>,
  ) -> Result<Self> {
    let mut customer_idx = HashMap::with_capacity(customers.len());
    for (i, c) in customers.iter().enumerate() {
      if customer_idx.insert(c.customer_key, i).is_some() {
        return Err(Error::DuplicateCustomer(c.customer_key));
      }
    }

    let mut product_idx = HashMap::with_capacity(products.len());
    for (i, p) in products.iter().enumerate() {
      if product_idx.insert(p.product_key, i).is_some() {
        return Err(Error::DuplicateProduct(p.product_key));
      }
    }

    tracing::debug!(
      sales = sales.len(),
      customers = customers.len(),
      products = products.len(),
      "dataset indexed"
    );

    Ok(Self { sales, customers, products, customer_idx, product_idx })
  }

  pub fn sales(&self) -> &[SalesFact] { &self.sales }

  pub fn customers(&self) -> &[Customer] { &self.customers }

  pub fn products(&self) -> &[Product] { &self.products }

  pub fn customer(&self, key: CustomerKey) -> Option<&Customer> {
    self.customer_idx.get(&key).map(|&i| &self.customers[i])
  }

  pub fn product(&self, key: ProductKey) -> Option<&Product> {
    self.product_idx.get(&key).map(|&i| &self.products[i])
  }

  /// Every fact in load order, left-joined to both dimensions.
  pub fn joined(&self) -> impl Iterator<Item = JoinedSale<'_>> + '_ {
    self.sales.iter().map(|fact| JoinedSale {
      fact,
      customer: self.customer(fact.customer_key),
      product: self.product(fact.product_key),
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn customer(key: CustomerKey) -> Customer {
    Customer {
      customer_key:    key,
      customer_number: format!("AW{key:08}"),
      first_name:      "Jon".into(),
      last_name:       "Yang".into(),
      birthdate:       None,
      gender:          Some("Male".into()),
      country:         Some("Australia".into()),
    }
  }

  fn product(key: ProductKey) -> Product {
    Product {
      product_key:    key,
      product_number: format!("BK-{key}"),
      product_name:   format!("Bike {key}"),
      category:       Some("Bikes".into()),
      subcategory:    Some("Road Bikes".into()),
      cost:           1000.0,
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn joined_resolves_both_sides() {
    let ds = Dataset::new(
      vec![SalesFact::new("SO1", date(2023, 1, 1), 1, 10, 2, 50.0)],
      vec![customer(1)],
      vec![product(10)],
    )
    .unwrap();

    let rows: Vec<_> = ds.joined().collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer.unwrap().customer_key, 1);
    assert_eq!(rows[0].product.unwrap().product_name, "Bike 10");
    assert_eq!(rows[0].fact.sales_amount, Some(100.0));
  }

  #[test]
  fn unmatched_keys_are_kept_as_none() {
    let ds = Dataset::new(
      vec![SalesFact::new("SO1", date(2023, 1, 1), 99, 77, 1, 5.0)],
      vec![customer(1)],
      vec![product(10)],
    )
    .unwrap();

    let row = ds.joined().next().unwrap();
    assert!(row.customer.is_none());
    assert!(row.product.is_none());
  }

  #[test]
  fn duplicate_dimension_keys_are_rejected() {
    let err = Dataset::new(vec![], vec![customer(1), customer(1)], vec![])
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateCustomer(1)));

    let err =
      Dataset::new(vec![], vec![], vec![product(3), product(3)]).unwrap_err();
    assert!(matches!(err, Error::DuplicateProduct(3)));
  }

  #[test]
  fn full_name_trims_blank_parts() {
    let mut c = customer(1);
    c.last_name = String::new();
    assert_eq!(c.full_name(), "Jon");
  }
}
