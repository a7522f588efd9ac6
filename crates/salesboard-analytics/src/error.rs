//! Error types for the reporting engines.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A share-of-total was requested over groups whose overall total is zero.
  #[error("cannot compute share of {measure}: overall total is zero")]
  DivisionByZero { measure: &'static str },

  #[error("core error: {0}")]
  Core(#[from] salesboard_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
