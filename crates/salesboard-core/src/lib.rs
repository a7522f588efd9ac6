//! Core types and trait definitions for the salesboard reporting engines.
//!
//! This crate is deliberately free of database dependencies. The analytics
//! engines and storage backends depend on it; it depends on nothing of
//! theirs.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod dataset;
pub mod error;
pub mod model;
pub mod warehouse;

pub use dataset::{Dataset, JoinedSale};
pub use error::{Error, Result};
pub use warehouse::{SalesWarehouse, load_dataset};
