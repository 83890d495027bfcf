//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::NaiveDate;
use civreg_core::{
  error::Lookup,
  page::{Pagination, Slice},
  person::{NewPerson, PersonRecord},
  predicate::PredicateSet,
  store::RecordStore,
  uniqueness::{UniqueField, first_conflict},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, functions::FunctionFlags};

use crate::{
  Error, Result,
  encode::{PERSON_COLUMNS, RawPerson, encode_date},
  filter::compile,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A person-record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of the guarded insert, decided inside the transaction.
enum Insert {
  Stored(RawPerson),
  Duplicate(UniqueField),
}

/// Result of the death transition, decided inside the transaction.
enum Transition {
  Done(RawPerson),
  Missing,
  AlreadyDeceased,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_where(
    &self,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<Option<PersonRecord>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE {column} = ?1"),
            [value],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }
}

/// Per-connection SQL functions. SQLite's built-in `lower()` folds ASCII only.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "unicode_lower",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

/// Map a failed insert to the unique column it collided on, if that is what
/// happened. Backstop for the in-transaction guard.
pub(crate) fn unique_violation(e: &rusqlite::Error) -> Option<UniqueField> {
  let rusqlite::Error::SqliteFailure(err, Some(msg)) = e else { return None };
  if err.code != rusqlite::ErrorCode::ConstraintViolation {
    return None;
  }
  msg
    .strip_prefix("UNIQUE constraint failed: persons.")
    .and_then(UniqueField::from_column)
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<RawPerson> {
  conn.query_row(
    &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
    [id],
    RawPerson::from_row,
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, person: NewPerson) -> Result<PersonRecord> {
    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the guard and the insert
        // see no interleaved writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let taken = first_conflict(&person, |field, value| {
          tx.query_row(
            &format!("SELECT 1 FROM persons WHERE {} = ?1", field.column()),
            [value],
            |_| Ok(()),
          )
          .optional()
          .map(|hit| hit.is_some())
        })?;
        if let Some(field) = taken {
          return Ok(Insert::Duplicate(field));
        }

        let inserted = tx.execute(
          "INSERT INTO persons (
             full_name, address, phone_number, email, photo_url, national_id,
             age, gender, document_type, issue_date, expiry_date, citizenship,
             death_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            person.full_name,
            person.address,
            person.phone_number,
            person.email,
            person.photo_url,
            person.national_id,
            person.age,
            person.gender.as_str(),
            person.document_type.as_str(),
            encode_date(person.issue_date),
            encode_date(person.expiry_date),
            person.citizenship,
            person.death_date.map(encode_date),
          ],
        );
        if let Err(e) = inserted {
          return match unique_violation(&e) {
            Some(field) => Ok(Insert::Duplicate(field)),
            None => Err(e.into()),
          };
        }

        let raw = select_by_id(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(Insert::Stored(raw))
      })
      .await?;

    match outcome {
      Insert::Stored(raw) => raw.into_person(),
      Insert::Duplicate(field) => {
        tracing::debug!(%field, "insert rejected by uniqueness guard");
        Err(civreg_core::Error::Duplicate(field).into())
      }
    }
  }

  async fn get_by_id(&self, id: i64) -> Result<Option<PersonRecord>> {
    self.get_where("id", rusqlite::types::Value::Integer(id)).await
  }

  async fn get_by_national_id(&self, national_id: &str) -> Result<Option<PersonRecord>> {
    self
      .get_where("national_id", rusqlite::types::Value::Text(national_id.to_owned()))
      .await
  }

  async fn record_death(&self, id: i64, date: NaiveDate) -> Result<PersonRecord> {
    let date_str = encode_date(date);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let state: Option<Option<String>> = tx
          .query_row(
            "SELECT death_date FROM persons WHERE id = ?1",
            [id],
            |r| r.get(0),
          )
          .optional()?;
        match state {
          None => return Ok(Transition::Missing),
          Some(Some(_)) => return Ok(Transition::AlreadyDeceased),
          Some(None) => {}
        }

        // Compare-and-set on the alive state.
        let changed = tx.execute(
          "UPDATE persons SET death_date = ?1 WHERE id = ?2 AND death_date IS NULL",
          rusqlite::params![date_str, id],
        )?;
        if changed != 1 {
          return Ok(Transition::AlreadyDeceased);
        }

        let raw = select_by_id(&tx, id)?;
        tx.commit()?;
        Ok(Transition::Done(raw))
      })
      .await?;

    match outcome {
      Transition::Done(raw) => raw.into_person(),
      Transition::Missing => Err(civreg_core::Error::NotFound(Lookup::Id(id)).into()),
      Transition::AlreadyDeceased => Err(civreg_core::Error::AlreadyDeceased(id).into()),
    }
  }

  async fn scan(
    &self,
    filter: &PredicateSet,
    pagination: Pagination,
  ) -> Result<Slice<PersonRecord>> {
    let clause = compile(filter, Some(pagination));
    let where_sql = clause.sql();
    let mut params = clause.params;
    params.push(i64::from(pagination.size().fetch_limit()).into());

    // Keyset scans start from the cursor through the primary key; only the
    // offset strategy skips rows.
    let window = match pagination {
      Pagination::Offset { .. } => {
        params.push((pagination.skip() as i64).into());
        "LIMIT ? OFFSET ?"
      }
      Pagination::Keyset { .. } => "LIMIT ?",
    };
    let sql = format!(
      "SELECT {PERSON_COLUMNS} FROM persons {where_sql} ORDER BY id ASC {window}"
    );
    tracing::trace!(%sql, "scan");

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let rows = raws
      .into_iter()
      .map(RawPerson::into_person)
      .collect::<Result<Vec<_>>>()?;
    Ok(Slice::from_lookahead(rows, pagination, |r| r.id))
  }

  async fn count(&self, filter: &PredicateSet) -> Result<u64> {
    let clause = compile(filter, None);
    let sql = format!("SELECT COUNT(*) FROM persons {}", clause.sql());
    let params = clause.params;

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |r| r.get(0))?)
      })
      .await?;
    Ok(n as u64)
  }
}
