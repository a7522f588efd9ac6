//! Error types for `salesboard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("duplicate customer key: {0}")]
  DuplicateCustomer(i64),

  #[error("duplicate product key: {0}")]
  DuplicateProduct(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
