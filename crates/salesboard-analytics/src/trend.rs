//! Trend engine: per-period totals and ordered running aggregates.
//!
//! [`periods`] buckets dated facts by a truncated period start, summing one
//! [`Measure`] per period, and returns them ascending. [`cumulative`] then
//! walks that ordered sequence once, carrying a running total of the measure
//! and a running mean of the per-period average price. Facts without an
//! order date are not part of any period.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike as _, Days, NaiveDate};
use salesboard_core::model::{CustomerKey, SalesFact};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  aggregate::Measure,
  table::{Tabular, fmt_amount, fmt_opt_amount},
};

/// The width of a reporting period.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
  #[default]
  Year,
  Month,
  Day,
}

impl Granularity {
  /// The first day of the period containing `date`.
  pub fn truncate(self, date: NaiveDate) -> NaiveDate {
    match self {
      Self::Year => date - Days::new(date.ordinal0().into()),
      Self::Month => date - Days::new(date.day0().into()),
      Self::Day => date,
    }
  }
}

/// Totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
  pub period_start:   NaiveDate,
  /// Sum of the trended measure; null values add nothing.
  pub total:          f64,
  /// Distinct customers with an order in the period.
  pub customer_count: usize,
  pub quantity:       i64,
  /// Mean of the non-null prices in the period.
  pub average_price:  Option<f64>,
}

impl Tabular for PeriodRecord {
  fn headers() -> Vec<&'static str> {
    vec![
      "period_start",
      "total",
      "total_customers",
      "total_quantity",
      "average_price",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.period_start.to_string(),
      fmt_amount(self.total),
      self.customer_count.to_string(),
      self.quantity.to_string(),
      fmt_opt_amount(self.average_price),
    ]
  }
}

#[derive(Default)]
struct PeriodAccumulator {
  total:       f64,
  customers:   HashSet<CustomerKey>,
  quantity:    i64,
  price_sum:   f64,
  price_count: usize,
}

/// One record per period present in `facts`, ascending by period start,
/// with `measure` summed per period.
pub fn periods(
  facts: &[SalesFact],
  granularity: Granularity,
  measure: Measure,
) -> Vec<PeriodRecord> {
  let mut buckets: BTreeMap<NaiveDate, PeriodAccumulator> = BTreeMap::new();

  for fact in facts {
    let Some(date) = fact.order_date else { continue };
    let acc = buckets.entry(granularity.truncate(date)).or_default();
    acc.total += measure.numeric(fact).unwrap_or_default();
    acc.customers.insert(fact.customer_key);
    acc.quantity += fact.quantity.unwrap_or_default();
    if let Some(price) = fact.price {
      acc.price_sum += price;
      acc.price_count += 1;
    }
  }

  tracing::debug!(%granularity, %measure, periods = buckets.len(), "periods bucketed");

  buckets
    .into_iter()
    .map(|(period_start, acc)| PeriodRecord {
      period_start,
      total: acc.total,
      customer_count: acc.customers.len(),
      quantity: acc.quantity,
      average_price: (acc.price_count > 0)
        .then(|| acc.price_sum / acc.price_count as f64),
    })
    .collect()
}

/// A period with its running aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeRecord {
  pub period_start:         NaiveDate,
  pub total:                f64,
  pub running_total:        f64,
  pub average_price:        Option<f64>,
  /// Mean of every `average_price` seen so far in the current partition.
  pub moving_average_price: Option<f64>,
}

impl Tabular for CumulativeRecord {
  fn headers() -> Vec<&'static str> {
    vec![
      "period_start",
      "total",
      "running_total",
      "average_price",
      "moving_average_price",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.period_start.to_string(),
      fmt_amount(self.total),
      fmt_amount(self.running_total),
      fmt_opt_amount(self.average_price),
      fmt_opt_amount(self.moving_average_price),
    ]
  }
}

#[derive(Default)]
struct Scan {
  partition:   Option<NaiveDate>,
  running:     f64,
  price_sum:   f64,
  price_count: usize,
}

/// Running total and moving average price over `periods`, which must be in
/// ascending order (as returned by [`periods`]).
///
/// With `reset_every` set, both aggregates restart whenever a period falls
/// into a new coarser bucket, e.g. monthly periods restarting every year.
pub fn cumulative(
  periods: &[PeriodRecord],
  reset_every: Option<Granularity>,
) -> impl Iterator<Item = CumulativeRecord> + '_ {
  let mut scan = Scan::default();

  periods.iter().map(move |p| {
    if let Some(coarser) = reset_every {
      let partition = coarser.truncate(p.period_start);
      if scan.partition != Some(partition) {
        scan = Scan { partition: Some(partition), ..Scan::default() };
      }
    }

    scan.running += p.total;
    if let Some(price) = p.average_price {
      scan.price_sum += price;
      scan.price_count += 1;
    }

    CumulativeRecord {
      period_start:         p.period_start,
      total:                p.total,
      running_total:        scan.running,
      average_price:        p.average_price,
      moving_average_price: (scan.price_count > 0)
        .then(|| scan.price_sum / scan.price_count as f64),
    }
  })
}
