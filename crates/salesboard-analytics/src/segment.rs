//! Segmentation engine: rule-based customer and product classes.
//!
//! Customers are classed by how long they have been ordering and how much
//! they have spent. Products are classed by fixed cost bands. Both
//! classifiers are pure functions; the counting helpers tally one class per
//! entity.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use salesboard_core::{
  Dataset,
  model::{CustomerKey, Product, ProductKey},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::table::{Tabular, fmt_amount, fmt_opt_date};

/// Whole calendar months from `from` to `to`, ignoring the day of month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
  (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// How cost bands treat the values between the literal band edges.
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
pub enum CostBandRule {
  /// `< 100`, `101..=500`, `501..=1000`, else "Above 1000". A cost of
  /// exactly 100, or strictly between 100 and 101 or 500 and 501, lands in
  /// "Above 1000".
  #[default]
  SourceLiteral,
  /// `< 100`, `100..=500`, `(500, 1000]`, else "Above 1000".
  Contiguous,
}

/// Thresholds for both classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
  /// Minimum ordering lifespan for VIP or Regular.
  pub vip_min_lifespan_months: i32,
  /// Spending must be strictly above this to be VIP.
  pub vip_spending_threshold:  f64,
  pub cost_bands:              CostBandRule,
}

impl Default for SegmentationConfig {
  fn default() -> Self {
    Self {
      vip_min_lifespan_months: 12,
      vip_spending_threshold:  5000.0,
      cost_bands:              CostBandRule::default(),
    }
  }
}

// ─── Counting ────────────────────────────────────────────────────────────────

/// How many entities fell into one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCount<L> {
  pub segment: L,
  pub count:   usize,
}

impl<L: std::fmt::Display> Tabular for SegmentCount<L> {
  fn headers() -> Vec<&'static str> { vec!["segment", "total"] }

  fn cells(&self) -> Vec<String> {
    vec![self.segment.to_string(), self.count.to_string()]
  }
}

/// Tally labels, largest class first; equal counts keep label order.
fn tally<L: Ord + Copy>(labels: impl IntoIterator<Item = L>) -> Vec<SegmentCount<L>> {
  let mut counts: BTreeMap<L, usize> = BTreeMap::new();
  for label in labels {
    *counts.entry(label).or_default() += 1;
  }
  let mut out: Vec<_> = counts
    .into_iter()
    .map(|(segment, count)| SegmentCount { segment, count })
    .collect();
  out.sort_by(|a, b| b.count.cmp(&a.count));
  out
}

// ─── Customers ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display,
)]
pub enum CustomerSegment {
  #[strum(to_string = "VIP")]
  #[serde(rename = "VIP")]
  Vip,
  Regular,
  New,
}

impl CustomerSegment {
  pub fn classify(
    lifespan_months: i32,
    total_spending: f64,
    config: &SegmentationConfig,
  ) -> Self {
    if lifespan_months < config.vip_min_lifespan_months {
      Self::New
    } else if total_spending > config.vip_spending_threshold {
      Self::Vip
    } else {
      Self::Regular
    }
  }
}

/// Per-customer order history summary, derived from the fact table alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
  pub customer_key:    CustomerKey,
  pub total_spending:  f64,
  pub first_order:     Option<NaiveDate>,
  pub last_order:      Option<NaiveDate>,
  /// Zero when the customer has no dated order.
  pub lifespan_months: i32,
  pub segment:         CustomerSegment,
}

impl Tabular for CustomerProfile {
  fn headers() -> Vec<&'static str> {
    vec![
      "customer_key",
      "total_spending",
      "first_order",
      "last_order",
      "lifespan",
      "customer_segment",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.customer_key.to_string(),
      fmt_amount(self.total_spending),
      fmt_opt_date(self.first_order),
      fmt_opt_date(self.last_order),
      self.lifespan_months.to_string(),
      self.segment.to_string(),
    ]
  }
}

#[derive(Default)]
struct History {
  spending: f64,
  first:    Option<NaiveDate>,
  last:     Option<NaiveDate>,
}

/// One profile per customer key with at least one fact, ascending by key.
/// Keys missing from the customer dimension are still profiled.
pub fn customer_profiles(
  dataset: &Dataset,
  config: &SegmentationConfig,
) -> Vec<CustomerProfile> {
  let mut histories: BTreeMap<CustomerKey, History> = BTreeMap::new();
  for fact in dataset.sales() {
    let h = histories.entry(fact.customer_key).or_default();
    h.spending += fact.sales_amount.unwrap_or_default();
    if let Some(d) = fact.order_date {
      h.first = Some(h.first.map_or(d, |f| f.min(d)));
      h.last = Some(h.last.map_or(d, |l| l.max(d)));
    }
  }

  histories
    .into_iter()
    .map(|(customer_key, h)| {
      let lifespan_months = match (h.first, h.last) {
        (Some(first), Some(last)) => months_between(first, last),
        _ => 0,
      };
      CustomerProfile {
        customer_key,
        total_spending: h.spending,
        first_order: h.first,
        last_order: h.last,
        lifespan_months,
        segment: CustomerSegment::classify(lifespan_months, h.spending, config),
      }
    })
    .collect()
}

/// Customers per segment, largest segment first. Segments with no members
/// are omitted.
pub fn segment_counts(
  dataset: &Dataset,
  config: &SegmentationConfig,
) -> Vec<SegmentCount<CustomerSegment>> {
  tally(customer_profiles(dataset, config).into_iter().map(|p| p.segment))
}

// ─── Products ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display,
)]
pub enum CostBand {
  #[strum(to_string = "Below 100")]
  #[serde(rename = "Below 100")]
  Below100,
  #[strum(to_string = "101-500")]
  #[serde(rename = "101-500")]
  From101To500,
  #[strum(to_string = "501-1000")]
  #[serde(rename = "501-1000")]
  From501To1000,
  #[strum(to_string = "Above 1000")]
  #[serde(rename = "Above 1000")]
  Above1000,
}

impl CostBand {
  pub fn classify(cost: f64, rule: CostBandRule) -> Self {
    match rule {
      CostBandRule::SourceLiteral => {
        if cost < 100.0 {
          Self::Below100
        } else if (101.0..=500.0).contains(&cost) {
          Self::From101To500
        } else if (501.0..=1000.0).contains(&cost) {
          Self::From501To1000
        } else {
          Self::Above1000
        }
      }
      CostBandRule::Contiguous => {
        if cost < 100.0 {
          Self::Below100
        } else if cost <= 500.0 {
          Self::From101To500
        } else if cost <= 1000.0 {
          Self::From501To1000
        } else {
          Self::Above1000
        }
      }
    }
  }
}

/// A product with its cost band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCostBand {
  pub product_key:  ProductKey,
  pub product_name: String,
  pub cost:         f64,
  pub band:         CostBand,
}

impl Tabular for ProductCostBand {
  fn headers() -> Vec<&'static str> {
    vec!["product_key", "product_name", "cost", "cost_range"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.product_key.to_string(),
      self.product_name.clone(),
      fmt_amount(self.cost),
      self.band.to_string(),
    ]
  }
}

pub fn cost_bands(products: &[Product], rule: CostBandRule) -> Vec<ProductCostBand> {
  products
    .iter()
    .map(|p| ProductCostBand {
      product_key:  p.product_key,
      product_name: p.product_name.clone(),
      cost:         p.cost,
      band:         CostBand::classify(p.cost, rule),
    })
    .collect()
}

/// Products per cost band, largest band first.
pub fn cost_band_counts(
  products: &[Product],
  rule: CostBandRule,
) -> Vec<SegmentCount<CostBand>> {
  tally(products.iter().map(|p| CostBand::classify(p.cost, rule)))
}
