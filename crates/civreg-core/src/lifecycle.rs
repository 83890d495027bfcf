//! The alive → deceased state machine and the write-side service.
//!
//! A record starts [`LifeStatus::Alive`] (unless registered as deceased) and
//! may move to [`LifeStatus::Deceased`] exactly once. There is no way back and
//! the death date never changes after it is set.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  error::Lookup,
  logging::logged,
  person::{NewPerson, PersonRecord},
  store::{Classify as _, RecordStore},
  today,
};

// ─── State ───────────────────────────────────────────────────────────────────

/// Life state of a record. Serialised as a nullable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<NaiveDate>", into = "Option<NaiveDate>")]
pub enum LifeStatus {
  #[default]
  Alive,
  /// Terminal.
  Deceased { on: NaiveDate },
}

impl LifeStatus {
  pub fn is_alive(self) -> bool { matches!(self, Self::Alive) }

  pub fn death_date(self) -> Option<NaiveDate> {
    match self {
      Self::Alive => None,
      Self::Deceased { on } => Some(on),
    }
  }

  /// The transition out of `Alive`. Returns `None` from a terminal state.
  pub fn die(self, on: NaiveDate) -> Option<Self> {
    match self {
      Self::Alive => Some(Self::Deceased { on }),
      Self::Deceased { .. } => None,
    }
  }
}

impl From<Option<NaiveDate>> for LifeStatus {
  fn from(d: Option<NaiveDate>) -> Self {
    match d {
      Some(on) => Self::Deceased { on },
      None => Self::Alive,
    }
  }
}

impl From<LifeStatus> for Option<NaiveDate> {
  fn from(s: LifeStatus) -> Self { s.death_date() }
}

/// The reduced projection returned by [`LifecycleService::mark_deceased`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
  pub id:         i64,
  pub full_name:  String,
  pub death_date: NaiveDate,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The write path: record creation and the death transition.
pub struct LifecycleService<S> {
  store: Arc<S>,
}

impl<S> Clone for LifecycleService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RecordStore> LifecycleService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Validate and insert a new record.
  pub async fn create(&self, person: NewPerson) -> Result<PersonRecord> {
    logged("create", async {
      person.validate(today())?;
      self.store.insert(person).await.classify()
    })
    .await
  }

  /// Mark a living record deceased as of `date`.
  ///
  /// Not idempotent: a second call fails with [`Error::AlreadyDeceased`]
  /// whatever date it carries, and the first date is kept.
  pub async fn mark_deceased(&self, id: i64, date: NaiveDate) -> Result<DeathRecord> {
    logged("mark_deceased", async {
      let current = self
        .store
        .get_by_id(id)
        .await
        .classify()?
        .ok_or(Error::NotFound(Lookup::Id(id)))?;

      if date > today() {
        return Err(Error::validation("death_date", "must not be in the future"));
      }
      if current.status.die(date).is_none() {
        return Err(Error::AlreadyDeceased(id));
      }

      // The store re-checks the alive state at write time; a concurrent
      // winner turns this into AlreadyDeceased.
      let updated = self.store.record_death(id, date).await.classify()?;
      Ok(DeathRecord {
        id:         updated.id,
        full_name:  updated.full_name,
        death_date: date,
      })
    })
    .await
  }
}
