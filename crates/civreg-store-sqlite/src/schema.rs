//! SQL schema for the registry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- AUTOINCREMENT: ids strictly increase and are never reused.
-- No DELETE is ever issued against this table; the only UPDATE sets
-- death_date on a row where it is still NULL.
CREATE TABLE IF NOT EXISTS persons (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name      TEXT    NOT NULL,
    address        TEXT    NOT NULL,
    phone_number   TEXT    NOT NULL UNIQUE,
    email          TEXT    NOT NULL UNIQUE,
    photo_url      TEXT,
    national_id    TEXT    NOT NULL UNIQUE CHECK (length(national_id) = 14),
    age            INTEGER NOT NULL CHECK (age BETWEEN 0 AND 150),
    gender         TEXT    NOT NULL,   -- 'MALE' | 'FEMALE'
    document_type  TEXT    NOT NULL,   -- 'PASSPORT' | 'ID_CARD' | ...
    issue_date     TEXT    NOT NULL,   -- YYYY-MM-DD
    expiry_date    TEXT    NOT NULL,   -- YYYY-MM-DD
    citizenship    TEXT    NOT NULL,
    death_date     TEXT                -- YYYY-MM-DD; NULL while alive
);

CREATE INDEX IF NOT EXISTS persons_death_idx       ON persons(death_date);
CREATE INDEX IF NOT EXISTS persons_expiry_idx      ON persons(expiry_date);
CREATE INDEX IF NOT EXISTS persons_document_idx    ON persons(document_type);
CREATE INDEX IF NOT EXISTS persons_gender_age_idx  ON persons(gender, age);
CREATE INDEX IF NOT EXISTS persons_age_idx         ON persons(age);
CREATE INDEX IF NOT EXISTS persons_citizenship_idx ON persons(citizenship);

PRAGMA user_version = 1;
";
