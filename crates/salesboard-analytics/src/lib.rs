//! Reporting engines over a loaded sales star schema.
//!
//! Every engine is a pure, synchronous function of a
//! [`salesboard_core::Dataset`]; nothing here performs I/O or mutates its
//! input. Output is an ordered `Vec` of flat records, each implementing
//! [`Tabular`] for rendering.
//!
//! # Quick start
//!
//! ```no_run
//! use salesboard_analytics::{aggregate::Measure, trend, yoy};
//! # let dataset = salesboard_core::Dataset::default();
//!
//! let yearly =
//!   trend::periods(dataset.sales(), trend::Granularity::Year, Measure::SalesAmount);
//! for row in trend::cumulative(&yearly, None) {
//!   println!("{} {}", row.period_start, row.running_total);
//! }
//! let performance = yoy::year_over_year(&dataset);
//! println!("{} product-years", performance.len());
//! ```

pub mod aggregate;
pub mod error;
pub mod kpi;
pub mod report;
pub mod segment;
pub mod table;
pub mod trend;
pub mod yoy;

pub use error::{Error, Result};
pub use table::{Table, Tabular};

#[cfg(test)]
mod fixtures;
