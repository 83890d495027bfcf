//! Error type for `civreg-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Guard, lookup and transition failures decided by the store.
  #[error(transparent)]
  Core(#[from] civreg_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value in database: {value:?}")]
  UnknownEnum {
    column: &'static str,
    value:  String,
  },
}

impl From<Error> for civreg_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => civreg_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
