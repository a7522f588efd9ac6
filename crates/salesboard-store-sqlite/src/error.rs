//! Error type for `salesboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] salesboard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// The opened file lacks one of the star-schema tables.
  #[error("missing table: {0}")]
  MissingTable(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
