//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `civreg-store-sqlite`). The services
//! in this crate depend on the abstraction, never on a concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  page::{Pagination, Slice},
  person::{NewPerson, PersonRecord},
  predicate::PredicateSet,
};

/// Abstraction over a person-record store.
///
/// Records are never deleted and ids are never reused. The only mutation
/// after insert is the one-way death transition.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  /// Backend errors must classify into core errors: guard and transition
  /// failures surface as the matching core variant, everything else as
  /// [`crate::Error::Store`].
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Insert a record, assigning the next id.
  ///
  /// The uniqueness guard and the insert form one atomic unit: of two racing
  /// inserts sharing a unique value, exactly one succeeds and the other fails
  /// with [`crate::Error::Duplicate`] naming the first colliding field.
  fn insert(
    &self,
    person: NewPerson,
  ) -> impl Future<Output = Result<PersonRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// Retrieve a record by national id. Returns `None` if not found.
  fn get_by_national_id<'a>(
    &'a self,
    national_id: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + 'a;

  /// Set the death date of a living record and return the updated record.
  ///
  /// Compare-and-set on the alive state: fails with
  /// [`crate::Error::AlreadyDeceased`] if the record is no longer alive when
  /// the write lands, and [`crate::Error::NotFound`] if it does not exist.
  fn record_death(
    &self,
    id: i64,
    date: NaiveDate,
  ) -> impl Future<Output = Result<PersonRecord, Self::Error>> + Send + '_;

  /// Matching records in ascending id order, windowed by `pagination`.
  fn scan<'a>(
    &'a self,
    filter: &'a PredicateSet,
    pagination: Pagination,
  ) -> impl Future<Output = Result<Slice<PersonRecord>, Self::Error>> + Send + 'a;

  /// Number of matching records.
  fn count<'a>(
    &'a self,
    filter: &'a PredicateSet,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

/// Classify a backend result into a core result.
pub trait Classify<T> {
  fn classify(self) -> crate::Result<T>;
}

impl<T, E: Into<crate::Error>> Classify<T> for Result<T, E> {
  fn classify(self) -> crate::Result<T> { self.map_err(Into::into) }
}
