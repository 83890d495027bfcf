//! The uniqueness guard consulted by record creation.
//!
//! Three columns are globally unique. Backends evaluate the guard inside the
//! same atomic unit as the insert; this module only fixes which fields are
//! checked and in what order, so that conflict messages are deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::person::NewPerson;

/// A column carrying a global uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
  NationalId,
  Email,
  PhoneNumber,
}

impl UniqueField {
  /// Evaluation order of the guard; the first violated field is reported.
  pub const ORDER: [UniqueField; 3] =
    [Self::NationalId, Self::Email, Self::PhoneNumber];

  /// Storage column name.
  pub fn column(self) -> &'static str {
    match self {
      Self::NationalId => "national_id",
      Self::Email => "email",
      Self::PhoneNumber => "phone_number",
    }
  }

  /// Resolve a storage column name back to the field.
  pub fn from_column(column: &str) -> Option<Self> {
    Self::ORDER.into_iter().find(|f| f.column() == column)
  }

  /// The candidate's value for this field.
  pub fn value_of(self, person: &NewPerson) -> &str {
    match self {
      Self::NationalId => &person.national_id,
      Self::Email => &person.email,
      Self::PhoneNumber => &person.phone_number,
    }
  }
}

impl fmt::Display for UniqueField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NationalId => "nationalId",
      Self::Email => "email",
      Self::PhoneNumber => "phoneNumber",
    })
  }
}

/// Run the guard against an existence probe.
///
/// `taken(field, value)` reports whether some stored record already holds
/// `value` in `field`. Returns the first field, in [`UniqueField::ORDER`],
/// whose value is taken.
pub fn first_conflict<E>(
  candidate: &NewPerson,
  mut taken: impl FnMut(UniqueField, &str) -> Result<bool, E>,
) -> Result<Option<UniqueField>, E> {
  for field in UniqueField::ORDER {
    if taken(field, field.value_of(candidate))? {
      return Ok(Some(field));
    }
  }
  Ok(None)
}
