//! Flat-record view of engine output.
//!
//! Every engine record implements [`Tabular`] so a caller can render any
//! report as a table or delimited text without knowing its shape.

use chrono::NaiveDate;

/// A record that can be flattened into one row of string cells.
pub trait Tabular {
  /// Column names, in the same order as [`Tabular::cells`].
  fn headers() -> Vec<&'static str>;

  fn cells(&self) -> Vec<String>;
}

/// Headers plus string cells, for reports whose columns are only known at
/// run time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

impl Table {
  pub fn from_records<T: Tabular>(records: &[T]) -> Self {
    Self {
      headers: T::headers().into_iter().map(str::to_owned).collect(),
      rows:    records.iter().map(Tabular::cells).collect(),
    }
  }
}

/// Render a measure with two decimals, trimming a trailing `.00`. Values
/// that round to zero render as `0`, never `-0`.
pub fn fmt_amount(value: f64) -> String {
  let rounded = (value * 100.0).round() / 100.0;
  let rounded = if rounded == 0.0 { 0.0 } else { rounded };
  let s = format!("{rounded:.2}");
  match s.strip_suffix(".00") {
    Some(whole) => whole.to_owned(),
    None => s,
  }
}

/// Render an optional measure; null renders as an empty cell.
pub fn fmt_opt_amount(value: Option<f64>) -> String {
  value.map(fmt_amount).unwrap_or_default()
}

pub fn fmt_opt_date(value: Option<NaiveDate>) -> String {
  value.map(|d| d.to_string()).unwrap_or_default()
}

pub fn fmt_opt<T: ToString>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}
