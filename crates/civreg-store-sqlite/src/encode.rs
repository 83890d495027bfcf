//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, whose lexicographic order is
//! chronological, so range predicates compare the text directly. Enums are
//! stored in their wire spelling (`MALE`, `ID_CARD`, ...).

use chrono::NaiveDate;
use civreg_core::person::{DocumentType, Gender, PersonRecord};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_gender(s: &str) -> Result<Gender> {
  Gender::parse(s).ok_or_else(|| Error::UnknownEnum { column: "gender", value: s.to_owned() })
}

pub fn decode_document_type(s: &str) -> Result<DocumentType> {
  DocumentType::parse(s)
    .ok_or_else(|| Error::UnknownEnum { column: "document_type", value: s.to_owned() })
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "id, full_name, address, phone_number, email, photo_url, \
   national_id, age, gender, document_type, issue_date, expiry_date, citizenship, death_date";

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub id:            i64,
  pub full_name:     String,
  pub address:       String,
  pub phone_number:  String,
  pub email:         String,
  pub photo_url:     Option<String>,
  pub national_id:   String,
  pub age:           i32,
  pub gender:        String,
  pub document_type: String,
  pub issue_date:    String,
  pub expiry_date:   String,
  pub citizenship:   String,
  pub death_date:    Option<String>,
}

impl RawPerson {
  /// Read a row selected with [`PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      full_name:     row.get(1)?,
      address:       row.get(2)?,
      phone_number:  row.get(3)?,
      email:         row.get(4)?,
      photo_url:     row.get(5)?,
      national_id:   row.get(6)?,
      age:           row.get(7)?,
      gender:        row.get(8)?,
      document_type: row.get(9)?,
      issue_date:    row.get(10)?,
      expiry_date:   row.get(11)?,
      citizenship:   row.get(12)?,
      death_date:    row.get(13)?,
    })
  }

  pub fn into_person(self) -> Result<PersonRecord> {
    let death_date = self.death_date.as_deref().map(decode_date).transpose()?;

    Ok(PersonRecord {
      id:            self.id,
      full_name:     self.full_name,
      address:       self.address,
      phone_number:  self.phone_number,
      email:         self.email,
      photo_url:     self.photo_url,
      national_id:   self.national_id,
      age:           self.age,
      gender:        decode_gender(&self.gender)?,
      document_type: decode_document_type(&self.document_type)?,
      issue_date:    decode_date(&self.issue_date)?,
      expiry_date:   decode_date(&self.expiry_date)?,
      citizenship:   self.citizenship,
      status:        death_date.into(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_lexicographically() {
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    let c = encode_date(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    assert_eq!(b, "2024-02-29");
    assert!(b < c);
    assert_eq!(decode_date(&c).unwrap(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
  }

  #[test]
  fn bad_values_are_decode_errors() {
    assert!(matches!(decode_date("2024/01/01"), Err(Error::DateParse(_))));
    assert!(matches!(
      decode_gender("OTHER"),
      Err(Error::UnknownEnum { column: "gender", .. })
    ));
  }
}
