//! Error types for `civreg-core`.
//!
//! Every failure surfaced by the core falls into exactly one [`ErrorKind`].
//! Adapters map the kind to a transport status; the message is meant for
//! humans.

use std::fmt;

use thiserror::Error;

use crate::uniqueness::UniqueField;

/// Coarse classification of an [`Error`], stable across storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Validation,
  Internal,
}

impl ErrorKind {
  /// Errors caused by the request rather than by the system.
  pub fn is_client(self) -> bool { !matches!(self, Self::Internal) }
}

/// What a lookup was keyed on when it came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
  Id(i64),
  NationalId(String),
}

impl fmt::Display for Lookup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(id) => write!(f, "id: {id}"),
      Self::NationalId(nid) => write!(f, "national id: {nid}"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found with {0}")]
  NotFound(Lookup),

  #[error("person with this {0} already exists")]
  Duplicate(UniqueField),

  #[error("person {0} is already marked deceased")]
  AlreadyDeceased(i64),

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Duplicate(_) | Self::AlreadyDeceased(_) => ErrorKind::Conflict,
      Self::Validation { .. } => ErrorKind::Validation,
      Self::Store(_) => ErrorKind::Internal,
    }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
