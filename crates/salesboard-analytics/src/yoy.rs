//! Year-over-year engine: each product's yearly sales against its own
//! lifetime average and against its previous year on record.

use std::collections::BTreeMap;

use chrono::Datelike as _;
use salesboard_core::Dataset;
use serde::Serialize;
use strum::Display;

use crate::table::{Tabular, fmt_amount, fmt_opt, fmt_opt_amount};

/// How a year compares with the product's lifetime yearly average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum AvgChange {
  #[strum(to_string = "Above avg")]
  #[serde(rename = "Above avg")]
  AboveAvg,
  #[strum(to_string = "Below avg")]
  #[serde(rename = "Below avg")]
  BelowAvg,
  #[strum(to_string = "Avg")]
  #[serde(rename = "Avg")]
  Avg,
}

impl AvgChange {
  pub fn classify(diff_avg: f64) -> Self {
    if diff_avg > 0.0 {
      Self::AboveAvg
    } else if diff_avg < 0.0 {
      Self::BelowAvg
    } else {
      Self::Avg
    }
  }
}

/// How a year compares with the product's preceding year on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum PrevYearChange {
  #[strum(to_string = "Increase")]
  #[serde(rename = "Increase")]
  Increase,
  #[strum(to_string = "Decrease")]
  #[serde(rename = "Decrease")]
  Decrease,
  #[strum(to_string = "No change")]
  #[serde(rename = "No change")]
  NoChange,
}

impl PrevYearChange {
  pub fn classify(diff_prev_yr: f64) -> Self {
    if diff_prev_yr > 0.0 {
      Self::Increase
    } else if diff_prev_yr < 0.0 {
      Self::Decrease
    } else {
      Self::NoChange
    }
  }
}

/// One `(product, year)` row of the performance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOverYear {
  pub order_year:     i32,
  /// `None` groups facts whose product key has no dimension row.
  pub product_name:   Option<String>,
  pub current_sales:  f64,
  pub avg_sales:      f64,
  pub diff_avg:       f64,
  pub avg_change:     AvgChange,
  /// Sales of the preceding year present for this product, which need not
  /// be the preceding calendar year.
  pub previous_year:  Option<f64>,
  pub diff_prev_yr:   Option<f64>,
  pub prev_yr_change: Option<PrevYearChange>,
}

impl Tabular for YearOverYear {
  fn headers() -> Vec<&'static str> {
    vec![
      "order_year",
      "product_name",
      "current_sales",
      "avg_sales",
      "diff_avg",
      "avg_change",
      "py_sales",
      "diff_py",
      "py_change",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.order_year.to_string(),
      self.product_name.clone().unwrap_or_default(),
      fmt_amount(self.current_sales),
      fmt_amount(self.avg_sales),
      fmt_amount(self.diff_avg),
      self.avg_change.to_string(),
      fmt_opt_amount(self.previous_year),
      fmt_opt_amount(self.diff_prev_yr),
      fmt_opt(self.prev_yr_change),
    ]
  }
}

/// Yearly sales per product, compared with the product's average year and
/// with its previous year, ordered by `(product_name, order_year)`.
///
/// Facts without an order date are excluded; null sales amounts add nothing.
/// Money is compared at cent precision, so yearly totals reached through
/// different summation orders still classify as equal.
pub fn year_over_year(dataset: &Dataset) -> Vec<YearOverYear> {
  // Product name → year → current_sales. Both levels iterate ascending,
  // which gives the output order and each product's year sequence.
  let mut by_product: BTreeMap<Option<&str>, BTreeMap<i32, f64>> = BTreeMap::new();

  for row in dataset.joined() {
    let Some(date) = row.fact.order_date else { continue };
    let name = row.product.map(|p| p.product_name.as_str());
    *by_product
      .entry(name)
      .or_default()
      .entry(date.year())
      .or_default() += row.fact.sales_amount.unwrap_or_default();
  }

  let mut out = Vec::new();
  for (name, years) in by_product {
    let years: BTreeMap<i32, f64> =
      years.into_iter().map(|(year, sales)| (year, cents(sales))).collect();

    // First pass: the product-wide average.
    let avg_sales = cents(years.values().sum::<f64>() / years.len() as f64);

    // Second pass: lag by one position over the ordered years.
    let mut previous: Option<f64> = None;
    for (order_year, current_sales) in years {
      let diff_avg = cents(current_sales - avg_sales);
      let diff_prev_yr = previous.map(|py| cents(current_sales - py));
      out.push(YearOverYear {
        order_year,
        product_name: name.map(str::to_owned),
        current_sales,
        avg_sales,
        diff_avg,
        avg_change: AvgChange::classify(diff_avg),
        previous_year: previous,
        diff_prev_yr,
        prev_yr_change: diff_prev_yr.map(PrevYearChange::classify),
      });
      previous = Some(current_sales);
    }
  }

  tracing::debug!(rows = out.len(), "year-over-year computed");
  out
}

/// Round to two decimals, folding `-0.0` into `0.0`.
fn cents(value: f64) -> f64 {
  let rounded = (value * 100.0).round() / 100.0;
  if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::{dataset, date, product, sale};

  #[test]
  fn two_year_scenario() {
    let ds = dataset(
      vec![
        sale("SO1", date(2023, 1, 1), 1, 1, 100.0),
        sale("SO2", date(2024, 1, 1), 1, 1, 300.0),
      ],
      vec![],
      vec![product(1, "A", "Bikes", 10.0)],
    );

    let rows = year_over_year(&ds);
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.order_year, 2023);
    assert_eq!(first.avg_sales, 200.0);
    assert_eq!(first.diff_avg, -100.0);
    assert_eq!(first.avg_change, AvgChange::BelowAvg);
    assert_eq!(first.previous_year, None);
    assert_eq!(first.prev_yr_change, None);

    let second = &rows[1];
    assert_eq!(second.order_year, 2024);
    assert_eq!(second.avg_sales, 200.0);
    assert_eq!(second.diff_avg, 100.0);
    assert_eq!(second.avg_change, AvgChange::AboveAvg);
    assert_eq!(second.previous_year, Some(100.0));
    assert_eq!(second.diff_prev_yr, Some(200.0));
    assert_eq!(second.prev_yr_change, Some(PrevYearChange::Increase));
  }

  #[test]
  fn single_year_product_is_average_with_no_previous() {
    let ds = dataset(
      vec![
        sale("SO1", date(2022, 5, 1), 1, 7, 40.0),
        sale("SO2", date(2022, 9, 1), 2, 7, 60.0),
      ],
      vec![],
      vec![product(7, "Solo", "Bikes", 10.0)],
    );

    let rows = year_over_year(&ds);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].current_sales, 100.0);
    assert_eq!(rows[0].diff_avg, 0.0);
    assert_eq!(rows[0].avg_change, AvgChange::Avg);
    assert_eq!(rows[0].previous_year, None);
    assert_eq!(rows[0].diff_prev_yr, None);
    assert_eq!(rows[0].prev_yr_change, None);
  }

  #[test]
  fn equal_yearly_sales_are_average() {
    let ds = dataset(
      vec![
        sale("SO1", date(2021, 3, 1), 1, 1, 0.1),
        sale("SO2", date(2022, 3, 1), 1, 1, 0.1),
        sale("SO3", date(2023, 3, 1), 1, 1, 0.1),
      ],
      vec![],
      vec![product(1, "Tube", "Accessories", 0.05)],
    );

    let rows = year_over_year(&ds);
    assert_eq!(rows.len(), 3);
    for row in &rows {
      assert_eq!(row.avg_sales, 0.1);
      assert_eq!(row.diff_avg, 0.0);
      assert_eq!(row.avg_change, AvgChange::Avg);
      assert_eq!(row.cells()[4], "0");
    }
    assert_eq!(rows[1].prev_yr_change, Some(PrevYearChange::NoChange));
  }

  #[test]
  fn summation_order_does_not_change_the_year_label() {
    // 0.1 + 0.2 sums to 0.30000000000000004 in f64.
    let ds = dataset(
      vec![
        sale("SO1", date(2022, 3, 1), 1, 1, 0.1),
        sale("SO2", date(2022, 4, 1), 1, 1, 0.2),
        sale("SO3", date(2023, 3, 1), 1, 1, 0.3),
      ],
      vec![],
      vec![product(1, "Patch", "Accessories", 0.05)],
    );

    let rows = year_over_year(&ds);
    assert_eq!(rows[0].current_sales, 0.3);
    assert_eq!(rows[1].diff_prev_yr, Some(0.0));
    assert_eq!(rows[1].prev_yr_change, Some(PrevYearChange::NoChange));
    assert!(rows.iter().all(|r| r.avg_change == AvgChange::Avg));
  }

  #[test]
  fn previous_year_skips_gaps_in_the_calendar() {
    let ds = dataset(
      vec![
        sale("SO1", date(2020, 1, 1), 1, 1, 50.0),
        sale("SO2", date(2023, 1, 1), 1, 1, 50.0),
      ],
      vec![],
      vec![product(1, "Gap", "Bikes", 10.0)],
    );

    let rows = year_over_year(&ds);
    assert_eq!(rows[1].order_year, 2023);
    assert_eq!(rows[1].previous_year, Some(50.0));
    assert_eq!(rows[1].prev_yr_change, Some(PrevYearChange::NoChange));
  }

  #[test]
  fn ordered_by_product_then_year_with_unknown_product_first() {
    let ds = dataset(
      vec![
        sale("SO1", date(2024, 1, 1), 1, 2, 10.0),
        sale("SO2", date(2023, 1, 1), 1, 1, 20.0),
        sale("SO3", date(2023, 1, 1), 1, 2, 30.0),
        sale("SO4", date(2023, 1, 1), 1, 404, 5.0),
      ],
      vec![],
      vec![product(1, "Zeta", "Bikes", 1.0), product(2, "Alpha", "Bikes", 1.0)],
    );

    let order: Vec<_> = year_over_year(&ds)
      .into_iter()
      .map(|r| (r.product_name, r.order_year))
      .collect();
    assert_eq!(
      order,
      [
        (None, 2023),
        (Some("Alpha".to_owned()), 2023),
        (Some("Alpha".to_owned()), 2024),
        (Some("Zeta".to_owned()), 2023),
      ]
    );
  }

  #[test]
  fn decrease_is_labelled() {
    let ds = dataset(
      vec![
        sale("SO1", date(2021, 1, 1), 1, 1, 90.0),
        sale("SO2", date(2022, 1, 1), 1, 1, 30.0),
      ],
      vec![],
      vec![product(1, "Fading", "Bikes", 1.0)],
    );
    let rows = year_over_year(&ds);
    assert_eq!(rows[1].diff_prev_yr, Some(-60.0));
    assert_eq!(rows[1].prev_yr_change, Some(PrevYearChange::Decrease));
    assert_eq!(rows[1].cells()[8], "Decrease");
    assert_eq!(rows[0].cells()[5], "Above avg");
  }
}
