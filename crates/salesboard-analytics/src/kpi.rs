//! Headline measures and the date span of the fact table.

use chrono::NaiveDate;
use salesboard_core::Dataset;
use serde::Serialize;

use crate::{
  aggregate::{Measure, Reducer, total},
  segment::months_between,
  table::{Tabular, fmt_opt_amount, fmt_opt_date},
};

/// Business-wide key metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
  pub total_sales:        Option<f64>,
  pub total_quantity:     Option<f64>,
  pub average_price:      Option<f64>,
  pub total_orders:       usize,
  /// Rows in the product dimension.
  pub total_products:     usize,
  /// Rows in the customer dimension.
  pub total_customers:    usize,
  /// Distinct customer keys appearing in the fact table.
  pub ordering_customers: usize,
}

/// One `(measure_name, measure_value)` line of the key-metrics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
  pub measure_name:  &'static str,
  pub measure_value: Option<f64>,
}

impl Tabular for MetricRow {
  fn headers() -> Vec<&'static str> { vec!["measure_name", "measure_value"] }

  fn cells(&self) -> Vec<String> {
    vec![self.measure_name.to_owned(), fmt_opt_amount(self.measure_value)]
  }
}

pub fn key_metrics(dataset: &Dataset) -> KeyMetrics {
  let count_distinct = |m| {
    total(dataset, m, Reducer::CountDistinct).unwrap_or_default() as usize
  };

  KeyMetrics {
    total_sales:        total(dataset, Measure::SalesAmount, Reducer::Sum),
    total_quantity:     total(dataset, Measure::Quantity, Reducer::Sum),
    average_price:      total(dataset, Measure::Price, Reducer::Average),
    total_orders:       count_distinct(Measure::OrderNumber),
    total_products:     dataset.products().len(),
    total_customers:    dataset.customers().len(),
    ordering_customers: count_distinct(Measure::CustomerKey),
  }
}

impl KeyMetrics {
  /// The flat two-column form, one line per metric.
  pub fn as_rows(&self) -> Vec<MetricRow> {
    let row = |measure_name: &'static str, measure_value: Option<f64>| MetricRow {
      measure_name,
      measure_value,
    };
    vec![
      row("Total Sales", self.total_sales),
      row("Total Quantity", self.total_quantity),
      row("Average Price", self.average_price),
      row("Total Orders", Some(self.total_orders as f64)),
      row("Total Products", Some(self.total_products as f64)),
      row("Total Customers", Some(self.total_customers as f64)),
      row("Ordering Customers", Some(self.ordering_customers as f64)),
    ]
  }
}

/// First and last order dates plus the birthdate extremes of the customer
/// base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
  pub first_order:        NaiveDate,
  pub last_order:         NaiveDate,
  pub range_months:       i32,
  pub oldest_birthdate:   Option<NaiveDate>,
  pub youngest_birthdate: Option<NaiveDate>,
}

impl Tabular for DateRange {
  fn headers() -> Vec<&'static str> {
    vec![
      "first_order",
      "last_order",
      "range_months",
      "oldest_birthdate",
      "youngest_birthdate",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.first_order.to_string(),
      self.last_order.to_string(),
      self.range_months.to_string(),
      fmt_opt_date(self.oldest_birthdate),
      fmt_opt_date(self.youngest_birthdate),
    ]
  }
}

/// `None` when no fact carries an order date.
pub fn date_range(dataset: &Dataset) -> Option<DateRange> {
  let mut dates = dataset.sales().iter().filter_map(|f| f.order_date);
  let first = dates.next()?;
  let (first_order, last_order) =
    dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

  let births = dataset.customers().iter().filter_map(|c| c.birthdate);
  let oldest_birthdate = births.clone().min();
  let youngest_birthdate = births.max();

  Some(DateRange {
    first_order,
    last_order,
    range_months: months_between(first_order, last_order),
    oldest_birthdate,
    youngest_birthdate,
  })
}
