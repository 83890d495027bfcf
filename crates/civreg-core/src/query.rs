//! The read path: named filters over one parameterised scan.
//!
//! Every listing in the registry is a [`Filter`] paired with a [`Pagination`]
//! (or a count). The filter expands to a [`PredicateSet`] at call time so that
//! date-relative filters see the current day.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
  Error, Result,
  error::Lookup,
  logging::logged,
  page::{Page, Pagination, Slice},
  person::{DocumentType, Gender, PersonRecord},
  predicate::{Predicate, PredicateSet},
  store::{Classify as _, RecordStore},
  today,
};

/// The query surface exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  All,
  NameContains(String),
  Alive,
  Deceased,
  DeceasedBetween { start: NaiveDate, end: NaiveDate },
  ExpiredDocuments,
  DocumentsExpiringBetween { start: NaiveDate, end: NaiveDate },
  DocumentType(DocumentType),
  Gender(Gender),
  Citizenship(String),
  AgeRange { min: i32, max: i32 },
  AliveWithExpiredDocuments,
  GenderAndAgeRange { gender: Gender, min: i32, max: i32 },
}

impl Filter {
  /// Stable name used in logs.
  pub fn name(&self) -> &'static str {
    match self {
      Self::All => "all",
      Self::NameContains(_) => "name_contains",
      Self::Alive => "alive",
      Self::Deceased => "deceased",
      Self::DeceasedBetween { .. } => "deceased_between",
      Self::ExpiredDocuments => "expired_documents",
      Self::DocumentsExpiringBetween { .. } => "documents_expiring_between",
      Self::DocumentType(_) => "document_type",
      Self::Gender(_) => "gender",
      Self::Citizenship(_) => "citizenship",
      Self::AgeRange { .. } => "age_range",
      Self::AliveWithExpiredDocuments => "alive_with_expired_documents",
      Self::GenderAndAgeRange { .. } => "gender_and_age_range",
    }
  }

  /// Expand into predicates, evaluating "expired" against `today`.
  pub fn predicates(&self, today: NaiveDate) -> PredicateSet {
    match self {
      Self::All => PredicateSet::all(),
      Self::NameContains(s) => Predicate::NameContains(s.clone()).into(),
      Self::Alive => Predicate::Alive.into(),
      Self::Deceased => Predicate::Deceased.into(),
      Self::DeceasedBetween { start, end } => {
        Predicate::DeathDateBetween(*start, *end).into()
      }
      Self::ExpiredDocuments => Predicate::ExpiredAsOf(today).into(),
      Self::DocumentsExpiringBetween { start, end } => {
        Predicate::ExpiringBetween(*start, *end).into()
      }
      Self::DocumentType(t) => Predicate::DocumentTypeIs(*t).into(),
      Self::Gender(g) => Predicate::GenderIs(*g).into(),
      Self::Citizenship(c) => Predicate::CitizenshipIs(c.clone()).into(),
      Self::AgeRange { min, max } => Predicate::AgeBetween(*min, *max).into(),
      Self::AliveWithExpiredDocuments => {
        PredicateSet::of(Predicate::Alive).and(Predicate::ExpiredAsOf(today))
      }
      Self::GenderAndAgeRange { gender, min, max } => {
        PredicateSet::of(Predicate::GenderIs(*gender))
          .and(Predicate::AgeBetween(*min, *max))
      }
    }
  }

  fn resolve(&self) -> Result<PredicateSet> {
    let set = self.predicates(today());
    set.validate()?;
    Ok(set)
  }
}

/// Read-only operations. Runs fully in parallel with writes.
pub struct QueryService<S> {
  store: Arc<S>,
}

impl<S> Clone for QueryService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RecordStore> QueryService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn get_by_id(&self, id: i64) -> Result<PersonRecord> {
    logged("get_by_id", async {
      self
        .store
        .get_by_id(id)
        .await
        .classify()?
        .ok_or(Error::NotFound(Lookup::Id(id)))
    })
    .await
  }

  pub async fn get_by_national_id(&self, national_id: &str) -> Result<PersonRecord> {
    logged("get_by_national_id", async {
      self
        .store
        .get_by_national_id(national_id)
        .await
        .classify()?
        .ok_or_else(|| Error::NotFound(Lookup::NationalId(national_id.to_owned())))
    })
    .await
  }

  pub async fn is_alive(&self, id: i64) -> Result<bool> {
    logged("is_alive", async {
      let record = self
        .store
        .get_by_id(id)
        .await
        .classify()?
        .ok_or(Error::NotFound(Lookup::Id(id)))?;
      Ok(record.is_alive())
    })
    .await
  }

  /// One window of `filter`, using whichever strategy `pagination` selects.
  pub async fn list(
    &self,
    filter: &Filter,
    pagination: Pagination,
  ) -> Result<Slice<PersonRecord>> {
    logged(filter.name(), async {
      let set = filter.resolve()?;
      self.store.scan(&set, pagination).await.classify()
    })
    .await
  }

  /// Number of records matching `filter`.
  pub async fn count(&self, filter: &Filter) -> Result<u64> {
    logged("count", async {
      let set = filter.resolve()?;
      self.store.count(&set).await.classify()
    })
    .await
  }

  /// Offset window plus the total number of matching rows.
  ///
  /// Costs a full count on every call; prefer [`Self::list`].
  pub async fn list_with_total(
    &self,
    filter: &Filter,
    page: i64,
    size: i64,
  ) -> Result<Page<PersonRecord>> {
    logged("list_with_total", async {
      let pagination = Pagination::offset(page, size)?;
      let set = filter.resolve()?;
      let slice = self.store.scan(&set, pagination).await.classify()?;
      let total = self.store.count(&set).await.classify()?;
      Ok(Page::from_slice(slice, total))
    })
    .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compound_filters_expand_to_conjunctions() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let set = Filter::AliveWithExpiredDocuments.predicates(today);
    assert_eq!(set.terms(), &[Predicate::Alive, Predicate::ExpiredAsOf(today)]);

    let set = Filter::GenderAndAgeRange { gender: Gender::Male, min: 18, max: 30 }
      .predicates(today);
    assert_eq!(set.terms(), &[
      Predicate::GenderIs(Gender::Male),
      Predicate::AgeBetween(18, 30)
    ]);
    assert!(Filter::All.predicates(today).is_empty());
  }

  #[test]
  fn inverted_range_fails_resolution() {
    let f = Filter::AgeRange { min: 50, max: 10 };
    assert!(matches!(f.resolve(), Err(Error::Validation { .. })));
  }
}
