//! Translation of a [`PredicateSet`] plus pagination into a SQL `WHERE`
//! clause with positional parameters.

use civreg_core::{
  page::Pagination,
  predicate::{Predicate, PredicateSet},
};
use rusqlite::types::Value;

use crate::encode::encode_date;

/// A compiled `WHERE` clause (possibly empty) and its bound values, in order.
#[derive(Debug, Default)]
pub struct WhereClause {
  conds:      Vec<&'static str>,
  pub params: Vec<Value>,
}

impl WhereClause {
  fn push(&mut self, cond: &'static str, params: Vec<Value>) {
    self.conds.push(cond);
    self.params.extend(params);
  }

  pub fn sql(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}

fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

fn date(d: chrono::NaiveDate) -> Value { Value::Text(encode_date(d)) }

/// Compile `filter`; keyset pagination adds `id > after_id`.
pub fn compile(filter: &PredicateSet, pagination: Option<Pagination>) -> WhereClause {
  let mut w = WhereClause::default();

  for p in filter.terms() {
    match p {
      Predicate::NameContains(s) => {
        w.push("instr(unicode_lower(full_name), unicode_lower(?)) > 0", vec![text(s.as_str())])
      }
      Predicate::Alive => w.push("death_date IS NULL", vec![]),
      Predicate::Deceased => w.push("death_date IS NOT NULL", vec![]),
      Predicate::DeathDateBetween(a, b) => {
        w.push("death_date BETWEEN ? AND ?", vec![date(*a), date(*b)])
      }
      Predicate::ExpiredAsOf(today) => w.push("expiry_date < ?", vec![date(*today)]),
      Predicate::ExpiringBetween(a, b) => {
        w.push("expiry_date BETWEEN ? AND ?", vec![date(*a), date(*b)])
      }
      Predicate::DocumentTypeIs(t) => w.push("document_type = ?", vec![text(t.as_str())]),
      Predicate::GenderIs(g) => w.push("gender = ?", vec![text(g.as_str())]),
      Predicate::CitizenshipIs(c) => w.push("citizenship = ?", vec![text(c.as_str())]),
      Predicate::AgeBetween(min, max) => w.push(
        "age BETWEEN ? AND ?",
        vec![Value::Integer(i64::from(*min)), Value::Integer(i64::from(*max))],
      ),
    }
  }

  if let Some(Pagination::Keyset { after_id, .. }) = pagination {
    w.push("id > ?", vec![Value::Integer(after_id)]);
  }

  w
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use civreg_core::person::Gender;

  use super::*;

  #[test]
  fn empty_set_has_no_where_clause() {
    let w = compile(&PredicateSet::all(), None);
    assert_eq!(w.sql(), "");
    assert!(w.params.is_empty());
  }

  #[test]
  fn terms_are_anded_in_order_with_cursor_last() {
    let set = PredicateSet::of(Predicate::GenderIs(Gender::Male))
      .and(Predicate::AgeBetween(18, 30));
    let w = compile(&set, Some(Pagination::keyset(42, 10).unwrap()));
    assert_eq!(w.sql(), "WHERE gender = ? AND age BETWEEN ? AND ? AND id > ?");
    assert_eq!(w.params, vec![
      Value::Text("MALE".into()),
      Value::Integer(18),
      Value::Integer(30),
      Value::Integer(42),
    ]);
  }

  #[test]
  fn offset_pagination_adds_no_condition() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    let set = PredicateSet::of(Predicate::Alive).and(Predicate::ExpiredAsOf(today));
    let w = compile(&set, Some(Pagination::offset(3, 10).unwrap()));
    assert_eq!(w.sql(), "WHERE death_date IS NULL AND expiry_date < ?");
    assert_eq!(w.params, vec![Value::Text("2025-01-02".into())]);
  }
}
