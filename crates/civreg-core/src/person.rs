//! The person record, the single entity of the registry.
//!
//! A record is created once, may later transition from alive to deceased, and
//! is never removed. Identity is a store-assigned integer that only grows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, lifecycle::LifeStatus};

/// Fixed length of a national identification number (PINFL).
pub const NATIONAL_ID_LEN: usize = 14;

pub const MIN_AGE: i32 = 0;
pub const MAX_AGE: i32 = 150;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  /// The stored and wire representation.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "MALE",
      Self::Female => "FEMALE",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "MALE" => Some(Self::Male),
      "FEMALE" => Some(Self::Female),
      _ => None,
    }
  }
}

/// The identity document a record was registered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
  Passport,
  IdCard,
  DriverLicense,
  BirthCertificate,
}

impl DocumentType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Passport => "PASSPORT",
      Self::IdCard => "ID_CARD",
      Self::DriverLicense => "DRIVER_LICENSE",
      Self::BirthCertificate => "BIRTH_CERTIFICATE",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "PASSPORT" => Some(Self::Passport),
      "ID_CARD" => Some(Self::IdCard),
      "DRIVER_LICENSE" => Some(Self::DriverLicense),
      "BIRTH_CERTIFICATE" => Some(Self::BirthCertificate),
      _ => None,
    }
  }
}

// ─── PersonRecord ────────────────────────────────────────────────────────────

/// A stored person. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:            i64,
  pub full_name:     String,
  pub address:       String,
  pub phone_number:  String,
  pub email:         String,
  pub photo_url:     Option<String>,
  pub national_id:   String,
  pub age:           i32,
  pub gender:        Gender,
  pub document_type: DocumentType,
  pub issue_date:    NaiveDate,
  pub expiry_date:   NaiveDate,
  pub citizenship:   String,
  /// Serialised as the nullable `death_date`.
  #[serde(rename = "death_date")]
  pub status:        LifeStatus,
}

impl PersonRecord {
  pub fn is_alive(&self) -> bool { self.status.is_alive() }

  pub fn death_date(&self) -> Option<NaiveDate> { self.status.death_date() }

  /// Whether the identity document has lapsed: `expiry_date < today`.
  pub fn is_expired(&self, today: NaiveDate) -> bool { self.expiry_date < today }
}

// ─── NewPerson ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::insert`]. The store assigns `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
  pub full_name:     String,
  pub address:       String,
  pub phone_number:  String,
  pub email:         String,
  #[serde(default)]
  pub photo_url:     Option<String>,
  pub national_id:   String,
  pub age:           i32,
  pub gender:        Gender,
  pub document_type: DocumentType,
  pub issue_date:    NaiveDate,
  pub expiry_date:   NaiveDate,
  pub citizenship:   String,
  /// Registering an already-deceased person.
  #[serde(default)]
  pub death_date:    Option<NaiveDate>,
}

impl NewPerson {
  /// Check field constraints, reporting the first failing field.
  ///
  /// Fields are checked in declaration order. `today` bounds the issue date
  /// and an optional initial death date.
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    char_len("full_name", &self.full_name, 2, 100)?;
    char_len("address", &self.address, 5, 255)?;
    not_blank("phone_number", &self.phone_number)?;
    not_blank("email", &self.email)?;
    if !looks_like_email(self.email.trim()) {
      return Err(Error::validation("email", "must be a well-formed email address"));
    }
    if self.national_id.chars().count() != NATIONAL_ID_LEN {
      return Err(Error::validation(
        "national_id",
        format!("must be exactly {NATIONAL_ID_LEN} characters"),
      ));
    }
    if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
      return Err(Error::validation(
        "age",
        format!("must be between {MIN_AGE} and {MAX_AGE}"),
      ));
    }
    if self.issue_date > today {
      return Err(Error::validation("issue_date", "must not be in the future"));
    }
    char_len("citizenship", &self.citizenship, 2, 100)?;
    if let Some(d) = self.death_date
      && d > today
    {
      return Err(Error::validation("death_date", "must not be in the future"));
    }
    Ok(())
  }
}

fn not_blank(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be blank"));
  }
  Ok(())
}

fn char_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<()> {
  not_blank(field, value)?;
  let n = value.chars().count();
  if n < min || n > max {
    return Err(Error::validation(
      field,
      format!("length must be between {min} and {max}"),
    ));
  }
  Ok(())
}

/// `local@domain.tld`, no whitespace, a single `@`.
fn looks_like_email(s: &str) -> bool {
  let Some((local, domain)) = s.split_once('@') else { return false };
  !local.is_empty()
    && !domain.contains('@')
    && !s.chars().any(char::is_whitespace)
    && domain
      .split('.')
      .all(|label| !label.is_empty())
}
