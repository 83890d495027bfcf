//! Composable filters over person records.
//!
//! A [`PredicateSet`] is a conjunction of [`Predicate`]s. Backends translate
//! it into their own query language; [`PredicateSet::matches`] is the
//! reference evaluation used by in-process filtering and by tests.

use chrono::NaiveDate;

use crate::{
  Error, Result,
  person::{DocumentType, Gender, MAX_AGE, MIN_AGE, PersonRecord},
};

/// One filter condition. All ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
  /// Case-insensitive substring match on `full_name`.
  NameContains(String),
  Alive,
  Deceased,
  DeathDateBetween(NaiveDate, NaiveDate),
  /// `expiry_date < as_of`, strictly.
  ExpiredAsOf(NaiveDate),
  ExpiringBetween(NaiveDate, NaiveDate),
  DocumentTypeIs(DocumentType),
  GenderIs(Gender),
  /// Exact, case-sensitive match.
  CitizenshipIs(String),
  AgeBetween(i32, i32),
}

impl Predicate {
  pub fn matches(&self, r: &PersonRecord) -> bool {
    match self {
      Self::NameContains(needle) => r
        .full_name
        .to_lowercase()
        .contains(&needle.to_lowercase()),
      Self::Alive => r.is_alive(),
      Self::Deceased => !r.is_alive(),
      Self::DeathDateBetween(a, b) => {
        r.death_date().is_some_and(|d| *a <= d && d <= *b)
      }
      Self::ExpiredAsOf(today) => r.is_expired(*today),
      Self::ExpiringBetween(a, b) => *a <= r.expiry_date && r.expiry_date <= *b,
      Self::DocumentTypeIs(t) => r.document_type == *t,
      Self::GenderIs(g) => r.gender == *g,
      Self::CitizenshipIs(c) => r.citizenship == *c,
      Self::AgeBetween(min, max) => *min <= r.age && r.age <= *max,
    }
  }

  /// Reject malformed parameters: inverted ranges, out-of-domain ages and
  /// blank search strings.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::NameContains(s) if s.trim().is_empty() => {
        Err(Error::validation("name", "must not be blank"))
      }
      Self::CitizenshipIs(s) if s.trim().is_empty() => {
        Err(Error::validation("citizenship", "must not be blank"))
      }
      Self::DeathDateBetween(a, b) | Self::ExpiringBetween(a, b) if a > b => {
        Err(Error::validation("start", "must not be after end"))
      }
      Self::AgeBetween(min, max) => {
        if *min < MIN_AGE || *max > MAX_AGE {
          Err(Error::validation(
            "age",
            format!("range must lie within {MIN_AGE}..={MAX_AGE}"),
          ))
        } else if min > max {
          Err(Error::validation("min_age", "must not exceed max_age"))
        } else {
          Ok(())
        }
      }
      _ => Ok(()),
    }
  }
}

/// A conjunction of predicates. The empty set matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
  terms: Vec<Predicate>,
}

impl PredicateSet {
  /// Matches everything.
  pub fn all() -> Self { Self::default() }

  pub fn of(p: Predicate) -> Self { Self { terms: vec![p] } }

  /// Conjoin another predicate.
  pub fn and(mut self, p: Predicate) -> Self {
    self.terms.push(p);
    self
  }

  pub fn terms(&self) -> &[Predicate] { &self.terms }

  pub fn is_empty(&self) -> bool { self.terms.is_empty() }

  pub fn matches(&self, r: &PersonRecord) -> bool {
    self.terms.iter().all(|p| p.matches(r))
  }

  pub fn validate(&self) -> Result<()> {
    self.terms.iter().try_for_each(Predicate::validate)
  }
}

impl From<Predicate> for PredicateSet {
  fn from(p: Predicate) -> Self { Self::of(p) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lifecycle::LifeStatus;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn record() -> PersonRecord {
    PersonRecord {
      id:            1,
      full_name:     "Alice Liddell".into(),
      address:       "12 Rabbit Hole Lane".into(),
      phone_number:  "+1".into(),
      email:         "a@x.com".into(),
      photo_url:     None,
      national_id:   "12345678901234".into(),
      age:           30,
      gender:        Gender::Female,
      document_type: DocumentType::IdCard,
      issue_date:    date(2020, 1, 1),
      expiry_date:   date(2025, 6, 1),
      citizenship:   "Uzbekistan".into(),
      status:        LifeStatus::Alive,
    }
  }

  #[test]
  fn name_search_ignores_case() {
    let r = record();
    assert!(Predicate::NameContains("lIDDe".into()).matches(&r));
    assert!(!Predicate::NameContains("bob".into()).matches(&r));

    let mut r = record();
    r.full_name = "АЛИШЕР Навоий".into();
    assert!(Predicate::NameContains("алишер".into()).matches(&r));
    assert!(Predicate::NameContains("НАВОИЙ".into()).matches(&r));
  }

  #[test]
  fn expired_is_strict() {
    let mut r = record();
    let today = date(2025, 6, 1);
    r.expiry_date = today;
    assert!(!Predicate::ExpiredAsOf(today).matches(&r));
    r.expiry_date = today.pred_opt().unwrap();
    assert!(Predicate::ExpiredAsOf(today).matches(&r));
  }

  #[test]
  fn date_ranges_are_inclusive() {
    let r = record();
    let p = Predicate::ExpiringBetween(date(2025, 6, 1), date(2025, 6, 1));
    assert!(p.matches(&r));
    let p = Predicate::ExpiringBetween(date(2025, 6, 2), date(2025, 7, 1));
    assert!(!p.matches(&r));
  }

  #[test]
  fn death_range_never_matches_the_living() {
    let mut r = record();
    let p = Predicate::DeathDateBetween(date(2000, 1, 1), date(2030, 1, 1));
    assert!(!p.matches(&r));
    r.status = LifeStatus::Deceased { on: date(2024, 2, 29) };
    assert!(p.matches(&r));
    assert!(Predicate::Deceased.matches(&r));
    assert!(!Predicate::Alive.matches(&r));
  }

  #[test]
  fn conjunction_requires_every_term() {
    let r = record();
    let set = PredicateSet::of(Predicate::GenderIs(Gender::Female))
      .and(Predicate::AgeBetween(30, 30));
    assert!(set.matches(&r));
    let set = set.and(Predicate::DocumentTypeIs(DocumentType::Passport));
    assert!(!set.matches(&r));
    assert!(PredicateSet::all().matches(&r));
  }

  #[test]
  fn inverted_ranges_are_rejected() {
    assert!(Predicate::AgeBetween(40, 20).validate().is_err());
    assert!(Predicate::AgeBetween(0, 151).validate().is_err());
    assert!(Predicate::AgeBetween(0, 150).validate().is_ok());
    assert!(
      Predicate::ExpiringBetween(date(2025, 2, 1), date(2025, 1, 1))
        .validate()
        .is_err()
    );
    let set = PredicateSet::of(Predicate::Alive).and(Predicate::NameContains("  ".into()));
    assert!(matches!(set.validate(), Err(Error::Validation { field: "name", .. })));
  }
}
