//! Consolidated customer and product reports.
//!
//! Each report gathers one entity's order activity (orders, spend, quantity,
//! first and last order) and derives recency, lifespan, averages, and a
//! class label from it. All date arithmetic is relative to an explicit
//! `as_of` date supplied by the caller.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike as _, NaiveDate};
use salesboard_core::{
  Dataset, JoinedSale,
  model::{CustomerKey, ProductKey},
};
use serde::Serialize;
use strum::Display;

use crate::{
  segment::{CustomerSegment, SegmentationConfig, months_between},
  table::{Tabular, fmt_amount, fmt_opt, fmt_opt_amount},
};

// ─── Shared activity scan ────────────────────────────────────────────────────

struct Activity<'a> {
  orders:           HashSet<&'a str>,
  /// Products for a customer, customers for a product.
  counterparts:     HashSet<i64>,
  sales:            f64,
  quantity:         i64,
  first:            NaiveDate,
  last:             NaiveDate,
  unit_price_sum:   f64,
  unit_price_count: usize,
}

impl<'a> Activity<'a> {
  fn starting(date: NaiveDate) -> Self {
    Self {
      orders:           HashSet::new(),
      counterparts:     HashSet::new(),
      sales:            0.0,
      quantity:         0,
      first:            date,
      last:             date,
      unit_price_sum:   0.0,
      unit_price_count: 0,
    }
  }

  fn record(&mut self, row: &JoinedSale<'a>, date: NaiveDate, counterpart: i64) {
    let fact = row.fact;
    self.orders.insert(&fact.order_number);
    self.counterparts.insert(counterpart);
    self.sales += fact.sales_amount.unwrap_or_default();
    self.quantity += fact.quantity.unwrap_or_default();
    self.first = self.first.min(date);
    self.last = self.last.max(date);
    if let (Some(amount), Some(qty)) = (fact.sales_amount, fact.quantity)
      && qty != 0
    {
      self.unit_price_sum += amount / qty as f64;
      self.unit_price_count += 1;
    }
  }

  fn lifespan(&self) -> i32 { months_between(self.first, self.last) }

  fn average_per_order(&self) -> f64 {
    if self.orders.is_empty() {
      0.0
    } else {
      self.sales / self.orders.len() as f64
    }
  }

  fn average_per_month(&self) -> f64 {
    match self.lifespan() {
      0 => self.sales,
      months => self.sales / f64::from(months),
    }
  }
}

// ─── Customer report ─────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display,
)]
pub enum AgeGroup {
  #[strum(to_string = "Under 20")]
  #[serde(rename = "Under 20")]
  Under20,
  #[strum(to_string = "20-29")]
  #[serde(rename = "20-29")]
  Twenties,
  #[strum(to_string = "30-39")]
  #[serde(rename = "30-39")]
  Thirties,
  #[strum(to_string = "40-49")]
  #[serde(rename = "40-49")]
  Forties,
  #[strum(to_string = "50 and above")]
  #[serde(rename = "50 and above")]
  FiftyPlus,
}

impl AgeGroup {
  pub fn classify(age: i32) -> Self {
    match age {
      ..=19 => Self::Under20,
      20..=29 => Self::Twenties,
      30..=39 => Self::Thirties,
      40..=49 => Self::Forties,
      _ => Self::FiftyPlus,
    }
  }
}

/// Difference of calendar years, as a birthday-agnostic age.
pub fn age_in_years(birthdate: NaiveDate, as_of: NaiveDate) -> i32 {
  as_of.year() - birthdate.year()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerReportRow {
  pub customer_key:          CustomerKey,
  /// `None` when the key has no row in the customer dimension.
  pub customer_number:       Option<String>,
  pub customer_name:         Option<String>,
  pub age:                   Option<i32>,
  pub age_group:             Option<AgeGroup>,
  pub segment:               CustomerSegment,
  pub last_order_date:       NaiveDate,
  pub recency_months:        i32,
  pub total_orders:          usize,
  pub total_sales:           f64,
  pub total_quantity:        i64,
  pub total_products:        usize,
  pub lifespan_months:       i32,
  pub average_order_value:   f64,
  pub average_monthly_spend: f64,
}

impl Tabular for CustomerReportRow {
  fn headers() -> Vec<&'static str> {
    vec![
      "customer_key",
      "customer_number",
      "customer_name",
      "age",
      "age_group",
      "customer_segment",
      "last_order_date",
      "recency",
      "total_orders",
      "total_sales",
      "total_quantity",
      "total_products",
      "lifespan",
      "avg_order_value",
      "avg_monthly_spend",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.customer_key.to_string(),
      self.customer_number.clone().unwrap_or_default(),
      self.customer_name.clone().unwrap_or_default(),
      fmt_opt(self.age),
      fmt_opt(self.age_group),
      self.segment.to_string(),
      self.last_order_date.to_string(),
      self.recency_months.to_string(),
      self.total_orders.to_string(),
      fmt_amount(self.total_sales),
      self.total_quantity.to_string(),
      self.total_products.to_string(),
      self.lifespan_months.to_string(),
      fmt_amount(self.average_order_value),
      fmt_amount(self.average_monthly_spend),
    ]
  }
}

/// One row per customer key with at least one dated order, ascending by key.
pub fn customer_report(
  dataset: &Dataset,
  as_of: NaiveDate,
  config: &SegmentationConfig,
) -> Vec<CustomerReportRow> {
  let mut activity: BTreeMap<CustomerKey, Activity<'_>> = BTreeMap::new();
  for row in dataset.joined() {
    let Some(date) = row.fact.order_date else { continue };
    activity
      .entry(row.fact.customer_key)
      .or_insert_with(|| Activity::starting(date))
      .record(&row, date, row.fact.product_key);
  }

  let rows: Vec<_> = activity
    .into_iter()
    .map(|(customer_key, a)| {
      let customer = dataset.customer(customer_key);
      let age = customer
        .and_then(|c| c.birthdate)
        .map(|b| age_in_years(b, as_of));
      let lifespan_months = a.lifespan();

      CustomerReportRow {
        customer_key,
        customer_number: customer.map(|c| c.customer_number.clone()),
        customer_name: customer.map(|c| c.full_name()),
        age,
        age_group: age.map(AgeGroup::classify),
        segment: CustomerSegment::classify(lifespan_months, a.sales, config),
        last_order_date: a.last,
        recency_months: months_between(a.last, as_of),
        total_orders: a.orders.len(),
        total_sales: a.sales,
        total_quantity: a.quantity,
        total_products: a.counterparts.len(),
        lifespan_months,
        average_order_value: a.average_per_order(),
        average_monthly_spend: a.average_per_month(),
      }
    })
    .collect();

  tracing::debug!(rows = rows.len(), %as_of, "customer report built");
  rows
}

// ─── Product report ──────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display,
)]
pub enum ProductPerformance {
  #[strum(to_string = "High-Performer")]
  #[serde(rename = "High-Performer")]
  High,
  #[strum(to_string = "Mid-Range")]
  #[serde(rename = "Mid-Range")]
  Mid,
  #[strum(to_string = "Low-Performer")]
  #[serde(rename = "Low-Performer")]
  Low,
}

impl ProductPerformance {
  pub fn classify(total_sales: f64) -> Self {
    if total_sales > 50_000.0 {
      Self::High
    } else if total_sales >= 10_000.0 {
      Self::Mid
    } else {
      Self::Low
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReportRow {
  pub product_key:             ProductKey,
  /// Dimension attributes are `None` for keys missing from `dim_products`.
  pub product_name:            Option<String>,
  pub category:                Option<String>,
  pub subcategory:             Option<String>,
  pub cost:                    Option<f64>,
  pub performance:             ProductPerformance,
  pub last_sale_date:          NaiveDate,
  pub recency_months:          i32,
  pub lifespan_months:         i32,
  pub total_orders:            usize,
  pub total_sales:             f64,
  pub total_quantity:          i64,
  pub total_customers:         usize,
  /// Mean of `sales_amount / quantity` over lines with a non-zero quantity,
  /// rounded to one decimal.
  pub average_selling_price:   Option<f64>,
  pub average_order_revenue:   f64,
  pub average_monthly_revenue: f64,
}

impl Tabular for ProductReportRow {
  fn headers() -> Vec<&'static str> {
    vec![
      "product_key",
      "product_name",
      "category",
      "subcategory",
      "cost",
      "product_segment",
      "last_sale_date",
      "recency_in_months",
      "lifespan",
      "total_orders",
      "total_sales",
      "total_quantity",
      "total_customers",
      "avg_selling_price",
      "avg_order_revenue",
      "avg_monthly_revenue",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.product_key.to_string(),
      self.product_name.clone().unwrap_or_default(),
      self.category.clone().unwrap_or_default(),
      self.subcategory.clone().unwrap_or_default(),
      fmt_opt_amount(self.cost),
      self.performance.to_string(),
      self.last_sale_date.to_string(),
      self.recency_months.to_string(),
      self.lifespan_months.to_string(),
      self.total_orders.to_string(),
      fmt_amount(self.total_sales),
      self.total_quantity.to_string(),
      self.total_customers.to_string(),
      fmt_opt_amount(self.average_selling_price),
      fmt_amount(self.average_order_revenue),
      fmt_amount(self.average_monthly_revenue),
    ]
  }
}

/// One row per product key with at least one dated order, ascending by key.
pub fn product_report(dataset: &Dataset, as_of: NaiveDate) -> Vec<ProductReportRow> {
  let mut activity: BTreeMap<ProductKey, Activity<'_>> = BTreeMap::new();
  for row in dataset.joined() {
    let Some(date) = row.fact.order_date else { continue };
    activity
      .entry(row.fact.product_key)
      .or_insert_with(|| Activity::starting(date))
      .record(&row, date, row.fact.customer_key);
  }

  let rows: Vec<_> = activity
    .into_iter()
    .map(|(product_key, a)| {
      let product = dataset.product(product_key);
      let average_selling_price = (a.unit_price_count > 0).then(|| {
        (a.unit_price_sum / a.unit_price_count as f64 * 10.0).round() / 10.0
      });

      ProductReportRow {
        product_key,
        product_name: product.map(|p| p.product_name.clone()),
        category: product.and_then(|p| p.category.clone()),
        subcategory: product.and_then(|p| p.subcategory.clone()),
        cost: product.map(|p| p.cost),
        performance: ProductPerformance::classify(a.sales),
        last_sale_date: a.last,
        recency_months: months_between(a.last, as_of),
        lifespan_months: a.lifespan(),
        total_orders: a.orders.len(),
        total_sales: a.sales,
        total_quantity: a.quantity,
        total_customers: a.counterparts.len(),
        average_selling_price,
        average_order_revenue: a.average_per_order(),
        average_monthly_revenue: a.average_per_month(),
      }
    })
    .collect();

  tracing::debug!(rows = rows.len(), %as_of, "product report built");
  rows
}

#[cfg(test)]
mod tests {
  use salesboard_core::model::SalesFact;

  use super::*;
  use crate::fixtures::{dataset, date, retail, sale};

  #[test]
  fn age_groups() {
    assert_eq!(AgeGroup::classify(19), AgeGroup::Under20);
    assert_eq!(AgeGroup::classify(20), AgeGroup::Twenties);
    assert_eq!(AgeGroup::classify(39), AgeGroup::Thirties);
    assert_eq!(AgeGroup::classify(49), AgeGroup::Forties);
    assert_eq!(AgeGroup::classify(50), AgeGroup::FiftyPlus);
    assert_eq!(AgeGroup::FiftyPlus.to_string(), "50 and above");
    assert_eq!(age_in_years(date(1990, 12, 31), date(2025, 1, 1)), 35);
  }

  #[test]
  fn customer_rows() {
    let mut ds = retail();
    let mut customers = ds.customers().to_vec();
    customers[0].birthdate = Some(date(1985, 7, 1));
    ds = dataset(ds.sales().to_vec(), customers, ds.products().to_vec());

    let report = customer_report(&ds, date(2025, 2, 1), &SegmentationConfig::default());
    assert_eq!(report.len(), 2);

    let c1 = &report[0];
    assert_eq!(c1.customer_key, 1);
    assert_eq!(c1.customer_name.as_deref(), Some("First1 Last1"));
    assert_eq!(c1.age, Some(40));
    assert_eq!(c1.age_group, Some(AgeGroup::Forties));
    assert_eq!(c1.segment, CustomerSegment::Vip);
    assert_eq!(c1.last_order_date, date(2024, 2, 29));
    assert_eq!(c1.recency_months, 12);
    assert_eq!(c1.total_orders, 3);
    assert_eq!(c1.total_sales, 5285.0);
    assert_eq!(c1.total_quantity, 4);
    assert_eq!(c1.total_products, 3);
    assert_eq!(c1.lifespan_months, 23);
    assert_eq!(c1.average_order_value, 5285.0 / 3.0);
    assert_eq!(c1.average_monthly_spend, 5285.0 / 23.0);

    let c2 = &report[1];
    assert_eq!(c2.age, None);
    assert_eq!(c2.age_group, None);
    assert_eq!(c2.segment, CustomerSegment::New);
  }

  #[test]
  fn zero_lifespan_spend_is_the_total() {
    let ds = dataset(vec![sale("SO1", date(2024, 4, 4), 5, 1, 80.0)], vec![], vec![]);
    let report = customer_report(&ds, date(2024, 4, 30), &SegmentationConfig::default());
    assert_eq!(report[0].lifespan_months, 0);
    assert_eq!(report[0].average_monthly_spend, 80.0);
    assert_eq!(report[0].recency_months, 0);
    assert_eq!(report[0].customer_number, None);
  }

  #[test]
  fn product_rows() {
    let report = product_report(&retail(), date(2024, 12, 1));
    assert_eq!(report.len(), 3);

    let bike = &report[0];
    assert_eq!(bike.product_key, 10);
    assert_eq!(bike.product_name.as_deref(), Some("Road-150"));
    assert_eq!(bike.total_sales, 6500.0);
    assert_eq!(bike.total_orders, 3);
    assert_eq!(bike.total_customers, 2);
    assert_eq!(bike.performance, ProductPerformance::Low);
    assert_eq!(bike.last_sale_date, date(2024, 2, 29));
    assert_eq!(bike.recency_months, 10);
    assert_eq!(bike.lifespan_months, 23);
    assert_eq!(bike.average_order_revenue, 6500.0 / 3.0);
    assert_eq!(bike.average_selling_price, Some(2166.7));
  }

  #[test]
  fn selling_price_ignores_zero_quantity_lines() {
    let mut free = SalesFact::new("SO2", date(2024, 1, 2), 1, 1, 0, 10.0);
    free.sales_amount = Some(50.0);
    let ds = dataset(
      vec![SalesFact::new("SO1", date(2024, 1, 1), 1, 1, 4, 2.5), free],
      vec![],
      vec![],
    );
    let report = product_report(&ds, date(2024, 1, 31));
    assert_eq!(report[0].average_selling_price, Some(2.5));
    assert_eq!(report[0].product_name, None);
  }

  #[test]
  fn performance_bands() {
    assert_eq!(ProductPerformance::classify(50_000.01), ProductPerformance::High);
    assert_eq!(ProductPerformance::classify(50_000.0), ProductPerformance::Mid);
    assert_eq!(ProductPerformance::classify(10_000.0), ProductPerformance::Mid);
    assert_eq!(ProductPerformance::classify(9_999.0), ProductPerformance::Low);
  }
}
