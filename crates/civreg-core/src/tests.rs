//! Service tests against an in-process store that evaluates predicates with
//! [`PredicateSet::matches`].

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex},
};

use chrono::{Days, NaiveDate};

use crate::{
  Error, Filter, LifecycleService, QueryService,
  error::Lookup,
  lifecycle::LifeStatus,
  page::{Pagination, Slice},
  person::{DocumentType, Gender, NewPerson, PersonRecord},
  predicate::PredicateSet,
  store::RecordStore,
  today,
  uniqueness::{UniqueField, first_conflict},
};

#[derive(Default)]
struct MemoryStore {
  rows: Mutex<BTreeMap<i64, PersonRecord>>,
}

impl RecordStore for MemoryStore {
  type Error = Error;

  async fn insert(&self, p: NewPerson) -> Result<PersonRecord, Error> {
    let mut rows = self.rows.lock().unwrap();
    let hit = first_conflict::<Error>(&p, |field, value| {
      Ok(rows.values().any(|r| match field {
        UniqueField::NationalId => r.national_id == value,
        UniqueField::Email => r.email == value,
        UniqueField::PhoneNumber => r.phone_number == value,
      }))
    })?;
    if let Some(field) = hit {
      return Err(Error::Duplicate(field));
    }
    let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
    let record = PersonRecord {
      id,
      full_name: p.full_name,
      address: p.address,
      phone_number: p.phone_number,
      email: p.email,
      photo_url: p.photo_url,
      national_id: p.national_id,
      age: p.age,
      gender: p.gender,
      document_type: p.document_type,
      issue_date: p.issue_date,
      expiry_date: p.expiry_date,
      citizenship: p.citizenship,
      status: p.death_date.into(),
    };
    rows.insert(id, record.clone());
    Ok(record)
  }

  async fn get_by_id(&self, id: i64) -> Result<Option<PersonRecord>, Error> {
    Ok(self.rows.lock().unwrap().get(&id).cloned())
  }

  async fn get_by_national_id<'a>(&'a self, nid: &'a str) -> Result<Option<PersonRecord>, Error> {
    Ok(self.rows.lock().unwrap().values().find(|r| r.national_id == nid).cloned())
  }

  async fn record_death(&self, id: i64, date: NaiveDate) -> Result<PersonRecord, Error> {
    let mut rows = self.rows.lock().unwrap();
    let row = rows.get_mut(&id).ok_or(Error::NotFound(Lookup::Id(id)))?;
    row.status = row.status.die(date).ok_or(Error::AlreadyDeceased(id))?;
    Ok(row.clone())
  }

  async fn scan<'a>(
    &'a self,
    filter: &'a PredicateSet,
    pagination: Pagination,
  ) -> Result<Slice<PersonRecord>, Error> {
    let rows = self.rows.lock().unwrap();
    let after = match pagination {
      Pagination::Keyset { after_id, .. } => after_id,
      Pagination::Offset { .. } => i64::MIN,
    };
    let window = rows
      .range(after.saturating_add(1)..)
      .map(|(_, r)| r)
      .filter(|r| filter.matches(r))
      .skip(pagination.skip() as usize)
      .take(pagination.size().fetch_limit() as usize)
      .cloned()
      .collect();
    Ok(Slice::from_lookahead(window, pagination, |r| r.id))
  }

  async fn count<'a>(&'a self, filter: &'a PredicateSet) -> Result<u64, Error> {
    Ok(self.rows.lock().unwrap().values().filter(|r| filter.matches(r)).count() as u64)
  }
}

fn services() -> (QueryService<MemoryStore>, LifecycleService<MemoryStore>) {
  let store = Arc::new(MemoryStore::default());
  (QueryService::new(store.clone()), LifecycleService::new(store))
}

fn person(n: u32) -> NewPerson {
  NewPerson {
    full_name:     format!("Person Number {n}"),
    address:       "1 Registry Square".into(),
    phone_number:  format!("+99890{n:07}"),
    email:         format!("p{n}@example.com"),
    photo_url:     None,
    national_id:   format!("{n:014}"),
    age:           (n % 90) as i32,
    gender:        if n % 2 == 0 { Gender::Male } else { Gender::Female },
    document_type: DocumentType::Passport,
    issue_date:    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    expiry_date:   today() + Days::new(365),
    citizenship:   "Uzbekistan".into(),
    death_date:    None,
  }
}

fn yesterday() -> NaiveDate { today() - Days::new(1) }

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn distinct_people_never_conflict() {
  let (q, l) = services();
  for n in 0..20 {
    l.create(person(n)).await.unwrap();
  }
  assert_eq!(q.count(&Filter::All).await.unwrap(), 20);
}

#[tokio::test]
async fn duplicate_national_id_is_a_conflict() {
  let (_, l) = services();
  l.create(person(1)).await.unwrap();

  let mut dup = person(2);
  dup.national_id = person(1).national_id;
  let err = l.create(dup).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate(UniqueField::NationalId)));
  assert_eq!(err.kind(), crate::ErrorKind::Conflict);

  let mut dup = person(3);
  dup.phone_number = person(1).phone_number;
  let err = l.create(dup).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate(UniqueField::PhoneNumber)));
}

#[tokio::test]
async fn invalid_person_is_rejected_before_storage() {
  let (q, l) = services();
  let mut p = person(1);
  p.age = 200;
  let err = l.create(p).await.unwrap_err();
  assert!(matches!(err, Error::Validation { field: "age", .. }));
  assert_eq!(q.count(&Filter::All).await.unwrap(), 0);
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lookups_report_not_found() {
  let (q, l) = services();
  let created = l.create(person(7)).await.unwrap();

  assert_eq!(q.get_by_id(created.id).await.unwrap(), created);
  assert_eq!(q.get_by_national_id(&created.national_id).await.unwrap().id, created.id);
  assert!(q.is_alive(created.id).await.unwrap());

  assert!(matches!(q.get_by_id(999).await, Err(Error::NotFound(Lookup::Id(999)))));
  assert!(matches!(
    q.get_by_national_id("00000000000000").await,
    Err(Error::NotFound(Lookup::NationalId(_)))
  ));
  assert!(matches!(q.is_alive(999).await, Err(Error::NotFound(_))));
}

// ─── Death transition ────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_deceased_succeeds_once() {
  let (q, l) = services();
  let a = l.create(person(1)).await.unwrap();

  let alive_before = q.count(&Filter::Alive).await.unwrap();
  let death = l.mark_deceased(a.id, yesterday()).await.unwrap();
  assert_eq!(death.id, a.id);
  assert_eq!(death.full_name, a.full_name);
  assert_eq!(death.death_date, yesterday());

  let err = l.mark_deceased(a.id, today()).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyDeceased(id) if id == a.id));
  assert!(err.to_string().contains("already marked deceased"));

  let stored = q.get_by_id(a.id).await.unwrap();
  assert_eq!(stored.status, LifeStatus::Deceased { on: yesterday() });
  assert_eq!(q.count(&Filter::Alive).await.unwrap(), alive_before - 1);
  assert!(!q.is_alive(a.id).await.unwrap());
}

#[tokio::test]
async fn mark_deceased_rejects_future_date_and_unknown_id() {
  let (q, l) = services();
  let a = l.create(person(1)).await.unwrap();

  let tomorrow = today() + Days::new(1);
  let err = l.mark_deceased(a.id, tomorrow).await.unwrap_err();
  assert!(matches!(err, Error::Validation { field: "death_date", .. }));
  assert!(q.is_alive(a.id).await.unwrap());

  let err = l.mark_deceased(404, yesterday()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn racing_transitions_have_one_winner() {
  let (q, l) = services();
  let a = l.create(person(1)).await.unwrap();
  let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
  let second = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();

  let (r1, r2) = tokio::join!(l.mark_deceased(a.id, first), l.mark_deceased(a.id, second));
  let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
  assert_eq!(winners, 1);

  let won = r1.as_ref().or(r2.as_ref()).unwrap().death_date;
  assert_eq!(q.get_by_id(a.id).await.unwrap().death_date(), Some(won));
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn keyset_walk_returns_exactly_the_filtered_set() {
  let (q, l) = services();
  for n in 0..53 {
    l.create(person(n)).await.unwrap();
  }
  let filter = Filter::Gender(Gender::Female);
  let expected = q.count(&filter).await.unwrap();

  let mut seen = Vec::new();
  let mut after = 0;
  loop {
    let slice = q.list(&filter, Pagination::keyset(after, 10).unwrap()).await.unwrap();
    assert!(slice.items.len() <= 10);
    seen.extend(slice.items.iter().map(|r| r.id));
    if !slice.has_next {
      break;
    }
    after = slice.next_after_id.unwrap();
  }

  assert_eq!(seen.len() as u64, expected);
  assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn offset_listing_clamps_and_counts() {
  let (q, l) = services();
  for n in 0..30 {
    l.create(person(n)).await.unwrap();
  }

  let first = q.list(&Filter::All, Pagination::offset(0, 100).unwrap()).await.unwrap();
  assert_eq!(first.items.len(), 25);
  assert!(first.has_next);

  let second = q.list(&Filter::All, Pagination::offset(1, 100).unwrap()).await.unwrap();
  assert_eq!(second.items.len(), 5);
  assert!(!second.has_next);

  let page = q.list_with_total(&Filter::All, 0, 10).await.unwrap();
  assert_eq!(page.total_elements, 30);
  assert_eq!(page.total_pages, 3);
  assert_eq!(page.items.len(), 10);

  let err = q.list_with_total(&Filter::All, 0, 0).await.unwrap_err();
  assert!(matches!(err, Error::Validation { field: "size", .. }));
}

#[tokio::test]
async fn alive_with_expired_documents_combines_both_terms() {
  let (q, l) = services();
  let mut expired_alive = person(1);
  expired_alive.expiry_date = yesterday();
  let mut expired_dead = person(2);
  expired_dead.expiry_date = yesterday();
  expired_dead.death_date = Some(yesterday());
  let mut expires_today = person(3);
  expires_today.expiry_date = today();

  let keep = l.create(expired_alive).await.unwrap();
  l.create(expired_dead).await.unwrap();
  l.create(expires_today).await.unwrap();

  let slice = q
    .list(&Filter::AliveWithExpiredDocuments, Pagination::keyset(0, 25).unwrap())
    .await
    .unwrap();
  assert_eq!(slice.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![keep.id]);
  assert_eq!(q.count(&Filter::ExpiredDocuments).await.unwrap(), 2);
}
