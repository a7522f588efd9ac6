//! Aggregation engine: grouped reductions over the joined fact table.
//!
//! A [`GroupBy`] names one or more [`Dimension`]s and any number of
//! `(measure, reducer)` pairs. Running it scans every joined fact once and
//! yields one [`GroupRow`] per distinct key combination. A null dimension
//! value is a key of its own; a null measure value is skipped.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, HashSet},
  fmt,
};

use chrono::Datelike as _;
use salesboard_core::{Dataset, JoinedSale, model::SalesFact};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  table::{Table, Tabular, fmt_amount, fmt_opt_amount},
};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The value of one grouping column for one fact.
///
/// `Null` orders before every other key, matching how SQL Server sorts
/// nulls in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
  Null,
  Int(i64),
  Text(String),
}

impl GroupKey {
  fn text(value: Option<&String>) -> Self {
    value.map_or(Self::Null, |s| Self::Text(s.clone()))
  }
}

impl fmt::Display for GroupKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => Ok(()),
      Self::Int(v) => write!(f, "{v}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// A column a report can group by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  Country,
  Gender,
  Category,
  Subcategory,
  ProductName,
  CustomerKey,
  ProductKey,
  OrderYear,
  /// `YYYY-MM`, so text order is chronological.
  OrderMonth,
}

impl Dimension {
  pub fn key(self, row: &JoinedSale<'_>) -> GroupKey {
    let date = row.fact.order_date;
    match self {
      Self::Country => GroupKey::text(row.customer.and_then(|c| c.country.as_ref())),
      Self::Gender => GroupKey::text(row.customer.and_then(|c| c.gender.as_ref())),
      Self::Category => GroupKey::text(row.product.and_then(|p| p.category.as_ref())),
      Self::Subcategory => {
        GroupKey::text(row.product.and_then(|p| p.subcategory.as_ref()))
      }
      Self::ProductName => GroupKey::text(row.product.map(|p| &p.product_name)),
      Self::CustomerKey => GroupKey::Int(row.fact.customer_key),
      Self::ProductKey => GroupKey::Int(row.fact.product_key),
      Self::OrderYear => date.map_or(GroupKey::Null, |d| GroupKey::Int(d.year().into())),
      Self::OrderMonth => date.map_or(GroupKey::Null, |d| {
        GroupKey::Text(d.format("%Y-%m").to_string())
      }),
    }
  }
}

// ─── Measures and reducers ───────────────────────────────────────────────────

/// A fact column a reducer can consume.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Measure {
  SalesAmount,
  Quantity,
  Price,
  OrderNumber,
  CustomerKey,
  ProductKey,
}

/// One measure value read off a fact. `Text` is countable but not summable.
#[derive(Debug, Clone, Copy)]
enum Value<'a> {
  Num(f64),
  Key(i64),
  Text(&'a str),
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Distinct<'a> {
  Bits(u64),
  Key(i64),
  Text(&'a str),
}

impl Measure {
  fn value(self, fact: &SalesFact) -> Option<Value<'_>> {
    match self {
      Self::SalesAmount => fact.sales_amount.map(Value::Num),
      Self::Quantity => fact.quantity.map(|q| Value::Num(q as f64)),
      Self::Price => fact.price.map(Value::Num),
      Self::OrderNumber => Some(Value::Text(&fact.order_number)),
      Self::CustomerKey => Some(Value::Key(fact.customer_key)),
      Self::ProductKey => Some(Value::Key(fact.product_key)),
    }
  }

  /// This measure on one fact as a number, the way [`Reducer::Sum`] reads
  /// it. The order number has no numeric value.
  pub fn numeric(self, fact: &SalesFact) -> Option<f64> {
    match self.value(fact)? {
      Value::Num(v) => Some(v),
      Value::Key(k) => Some(k as f64),
      Value::Text(_) => None,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Reducer {
  Sum,
  Count,
  CountDistinct,
  Average,
}

/// Running state of one reducer within one group.
#[derive(Debug, Default)]
struct Accumulator<'a> {
  count:    usize,
  numeric:  usize,
  sum:      f64,
  distinct: HashSet<Distinct<'a>>,
}

impl<'a> Accumulator<'a> {
  fn push(&mut self, reducer: Reducer, value: Option<Value<'a>>) {
    let Some(value) = value else { return };
    self.count += 1;
    match value {
      Value::Num(v) => {
        self.numeric += 1;
        self.sum += v;
      }
      Value::Key(k) => {
        self.numeric += 1;
        self.sum += k as f64;
      }
      Value::Text(_) => {}
    }
    if reducer == Reducer::CountDistinct {
      self.distinct.insert(match value {
        Value::Num(v) => Distinct::Bits(v.to_bits()),
        Value::Key(k) => Distinct::Key(k),
        Value::Text(s) => Distinct::Text(s),
      });
    }
  }

  fn finish(&self, reducer: Reducer) -> Option<f64> {
    match reducer {
      Reducer::Sum => (self.numeric > 0).then_some(self.sum),
      Reducer::Count => Some(self.count as f64),
      Reducer::CountDistinct => Some(self.distinct.len() as f64),
      Reducer::Average => (self.numeric > 0).then(|| self.sum / self.numeric as f64),
    }
  }
}

/// A named output column: `reducer(measure)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
  pub name:    String,
  pub measure: Measure,
  pub reducer: Reducer,
}

// ─── Group-by ────────────────────────────────────────────────────────────────

/// Output ordering of a [`GroupBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  /// Largest value of the i-th aggregation first; nulls last.
  Descending(usize),
  /// Smallest value of the i-th aggregation first; nulls last.
  Ascending(usize),
  /// Ascending by group key only.
  Keys,
}

impl Default for SortOrder {
  fn default() -> Self { Self::Descending(0) }
}

/// One output row: the key combination and one value per aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
  pub keys:   Vec<GroupKey>,
  pub values: Vec<Option<f64>>,
}

/// A grouped report definition.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
  dimensions:   Vec<Dimension>,
  aggregations: Vec<Aggregation>,
  sort:         SortOrder,
  limit:        Option<usize>,
}

/// The rows produced by [`GroupBy::run`] with their column names.
#[derive(Debug, Clone)]
pub struct GroupResult {
  pub dimensions:   Vec<Dimension>,
  pub aggregations: Vec<Aggregation>,
  pub rows:         Vec<GroupRow>,
}

impl GroupBy {
  pub fn new(dimensions: impl IntoIterator<Item = Dimension>) -> Self {
    Self { dimensions: dimensions.into_iter().collect(), ..Self::default() }
  }

  pub fn measure(
    mut self,
    name: impl Into<String>,
    measure: Measure,
    reducer: Reducer,
  ) -> Self {
    self.aggregations.push(Aggregation { name: name.into(), measure, reducer });
    self
  }

  pub fn sort(mut self, sort: SortOrder) -> Self {
    self.sort = sort;
    self
  }

  /// Keep only the first `n` rows after sorting (top-N / bottom-N).
  pub fn limit(mut self, n: usize) -> Self {
    self.limit = Some(n);
    self
  }

  pub fn run(&self, dataset: &Dataset) -> GroupResult {
    let mut groups: BTreeMap<Vec<GroupKey>, Vec<Accumulator<'_>>> = BTreeMap::new();

    for row in dataset.joined() {
      let keys: Vec<GroupKey> = self.dimensions.iter().map(|d| d.key(&row)).collect();
      let accs = groups.entry(keys).or_insert_with(|| {
        self.aggregations.iter().map(|_| Accumulator::default()).collect()
      });
      for (acc, agg) in accs.iter_mut().zip(&self.aggregations) {
        acc.push(agg.reducer, agg.measure.value(row.fact));
      }
    }

    // BTreeMap iteration is key-ascending; the stable sort below keeps that
    // as the tie-breaker.
    let mut rows: Vec<GroupRow> = groups
      .into_iter()
      .map(|(keys, accs)| GroupRow {
        keys,
        values: accs
          .iter()
          .zip(&self.aggregations)
          .map(|(acc, agg)| acc.finish(agg.reducer))
          .collect(),
      })
      .collect();

    match self.sort {
      SortOrder::Descending(i) => {
        rows.sort_by(|a, b| cmp_nulls_last(value_at(a, i), value_at(b, i), true))
      }
      SortOrder::Ascending(i) => {
        rows.sort_by(|a, b| cmp_nulls_last(value_at(a, i), value_at(b, i), false))
      }
      SortOrder::Keys => {}
    }

    if let Some(n) = self.limit {
      rows.truncate(n);
    }

    tracing::debug!(
      dimensions = ?self.dimensions,
      groups = rows.len(),
      "group-by complete"
    );

    GroupResult {
      dimensions: self.dimensions.clone(),
      aggregations: self.aggregations.clone(),
      rows,
    }
  }
}

fn value_at(row: &GroupRow, i: usize) -> Option<f64> {
  row.values.get(i).copied().flatten()
}

fn cmp_nulls_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) if descending => y.total_cmp(&x),
    (Some(x), Some(y)) => x.total_cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

impl GroupResult {
  pub fn to_table(&self) -> Table {
    let headers = self
      .dimensions
      .iter()
      .map(ToString::to_string)
      .chain(self.aggregations.iter().map(|a| a.name.clone()))
      .collect();
    let rows = self
      .rows
      .iter()
      .map(|r| {
        r.keys
          .iter()
          .map(ToString::to_string)
          .chain(r.values.iter().map(|v| fmt_opt_amount(*v)))
          .collect()
      })
      .collect();
    Table { headers, rows }
  }
}

/// Reduce `measure` over every fact in the dataset.
pub fn total(dataset: &Dataset, measure: Measure, reducer: Reducer) -> Option<f64> {
  let mut acc = Accumulator::default();
  for row in dataset.joined() {
    acc.push(reducer, measure.value(row.fact));
  }
  acc.finish(reducer)
}

/// Which end of a ranking to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
  Top(usize),
  Bottom(usize),
}

/// The best (or worst) `n` groups of `dimension` by `reducer(measure)`.
pub fn ranked(
  dataset: &Dataset,
  dimension: Dimension,
  measure: Measure,
  reducer: Reducer,
  rank: Rank,
) -> GroupResult {
  let name = format!("{reducer}_{measure}");
  let query = GroupBy::new([dimension]).measure(name, measure, reducer);
  let query = match rank {
    Rank::Top(n) => query.sort(SortOrder::Descending(0)).limit(n),
    Rank::Bottom(n) => query.sort(SortOrder::Ascending(0)).limit(n),
  };
  query.run(dataset)
}

// ─── Part-to-whole ───────────────────────────────────────────────────────────

/// What [`part_to_whole`] does when the overall total is zero.
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
pub enum ZeroTotal {
  /// Return [`Error::DivisionByZero`].
  #[default]
  Fail,
  /// Report every share as 0%.
  ReportZero,
}

/// One group's contribution to the overall total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
  pub group:      GroupKey,
  pub total:      f64,
  /// Percentage of the overall total, rounded to two decimals.
  pub percentage: f64,
}

impl Tabular for Share {
  fn headers() -> Vec<&'static str> { vec!["group", "total", "percentage"] }

  fn cells(&self) -> Vec<String> {
    vec![
      self.group.to_string(),
      fmt_amount(self.total),
      format!("{:.2}%", self.percentage),
    ]
  }
}

/// Each group's sum of `measure` and its share of the sum over all groups,
/// largest first.
pub fn part_to_whole(
  dataset: &Dataset,
  dimension: Dimension,
  measure: Measure,
  zero_total: ZeroTotal,
) -> Result<Vec<Share>> {
  let result = GroupBy::new([dimension])
    .measure("total", measure, Reducer::Sum)
    .run(dataset);

  let totals: Vec<(GroupKey, f64)> = result
    .rows
    .into_iter()
    .map(|mut r| (r.keys.remove(0), value_at_first(&r.values)))
    .collect();

  let overall: f64 = totals.iter().map(|(_, t)| t).sum();
  if overall == 0.0 && !totals.is_empty() && zero_total == ZeroTotal::Fail {
    return Err(Error::DivisionByZero { measure: measure.into() });
  }

  Ok(
    totals
      .into_iter()
      .map(|(group, total)| {
        let percentage = if overall == 0.0 {
          0.0
        } else {
          (total / overall * 100.0 * 100.0).round() / 100.0
        };
        Share { group, total, percentage }
      })
      .collect(),
  )
}

fn value_at_first(values: &[Option<f64>]) -> f64 {
  values.first().copied().flatten().unwrap_or(0.0)
}
