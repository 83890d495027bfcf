//! Handlers for the filtered listings.
//!
//! Every filter is mounted three times: `{path}` (offset slice, `?page&size`),
//! `{path}/cursor` (keyset, `?after_id&size`) and `{path}/count`. Filter
//! arguments are query parameters.
//!
//! | Path | Filter arguments |
//! |------|------------------|
//! | `/persons` | |
//! | `/persons/search` | `name` |
//! | `/persons/alive` | |
//! | `/persons/deceased` | |
//! | `/persons/deceased/between` | `start`, `end` |
//! | `/persons/documents/expired` | |
//! | `/persons/documents/expiring-between` | `start`, `end` |
//! | `/persons/documents/by-type` | `type` |
//! | `/persons/by-gender` | `gender` |
//! | `/persons/by-citizenship` | `citizenship` |
//! | `/persons/by-age-range` | `min_age`, `max_age` |
//! | `/persons/alive/documents/expired` | |
//! | `/persons/by-gender-and-age` | `gender`, `min_age`, `max_age` |
//!
//! `GET /persons/paged?page&size` additionally returns the total count.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use civreg_core::{
  Filter,
  page::{MAX_PAGE_SIZE, Page, Pagination, Slice},
  person::{DocumentType, Gender, PersonRecord},
  store::RecordStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, extract::Params};

/// Which listing a route serves; combined with [`ListingParams`] to build a
/// [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
  All,
  Search,
  Alive,
  Deceased,
  DeceasedBetween,
  Expired,
  ExpiringBetween,
  ByDocumentType,
  ByGender,
  ByCitizenship,
  ByAgeRange,
  AliveExpired,
  ByGenderAndAge,
}

impl Listing {
  /// Route path and listing, in mount order.
  pub const ROUTES: [(&'static str, Listing); 13] = [
    ("/persons", Self::All),
    ("/persons/search", Self::Search),
    ("/persons/alive", Self::Alive),
    ("/persons/deceased", Self::Deceased),
    ("/persons/deceased/between", Self::DeceasedBetween),
    ("/persons/documents/expired", Self::Expired),
    ("/persons/documents/expiring-between", Self::ExpiringBetween),
    ("/persons/documents/by-type", Self::ByDocumentType),
    ("/persons/by-gender", Self::ByGender),
    ("/persons/by-citizenship", Self::ByCitizenship),
    ("/persons/by-age-range", Self::ByAgeRange),
    ("/persons/alive/documents/expired", Self::AliveExpired),
    ("/persons/by-gender-and-age", Self::ByGenderAndAge),
  ];

  fn filter(self, p: &ListingParams) -> Result<Filter, ApiError> {
    Ok(match self {
      Self::All => Filter::All,
      Self::Search => Filter::NameContains(required(p.name.clone(), "name")?),
      Self::Alive => Filter::Alive,
      Self::Deceased => Filter::Deceased,
      Self::DeceasedBetween => Filter::DeceasedBetween {
        start: required(p.start, "start")?,
        end:   required(p.end, "end")?,
      },
      Self::Expired => Filter::ExpiredDocuments,
      Self::ExpiringBetween => Filter::DocumentsExpiringBetween {
        start: required(p.start, "start")?,
        end:   required(p.end, "end")?,
      },
      Self::ByDocumentType => Filter::DocumentType(required(p.document_type, "type")?),
      Self::ByGender => Filter::Gender(required(p.gender, "gender")?),
      Self::ByCitizenship => {
        Filter::Citizenship(required(p.citizenship.clone(), "citizenship")?)
      }
      Self::ByAgeRange => Filter::AgeRange {
        min: required(p.min_age, "min_age")?,
        max: required(p.max_age, "max_age")?,
      },
      Self::AliveExpired => Filter::AliveWithExpiredDocuments,
      Self::ByGenderAndAge => Filter::GenderAndAgeRange {
        gender: required(p.gender, "gender")?,
        min:    required(p.min_age, "min_age")?,
        max:    required(p.max_age, "max_age")?,
      },
    })
  }
}

fn required<T>(v: Option<T>, name: &'static str) -> Result<T, ApiError> {
  v.ok_or(ApiError::MissingParam(name))
}

/// Query parameters shared by every listing route.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
  pub name:          Option<String>,
  pub start:         Option<NaiveDate>,
  pub end:           Option<NaiveDate>,
  #[serde(rename = "type")]
  pub document_type: Option<DocumentType>,
  pub gender:        Option<Gender>,
  pub citizenship:   Option<String>,
  pub min_age:       Option<i32>,
  pub max_age:       Option<i32>,
  /// Offset mode page index. Default 0.
  pub page:          Option<i64>,
  /// Requested page size; clamped to [`MAX_PAGE_SIZE`]. Default 25.
  pub size:          Option<i64>,
  /// Keyset mode cursor. Default 0.
  pub after_id:      Option<i64>,
}

impl ListingParams {
  fn size(&self) -> i64 { self.size.unwrap_or(i64::from(MAX_PAGE_SIZE)) }
}

/// `GET {path}?page&size`
pub async fn slice<S: RecordStore>(
  State(app): State<AppState<S>>,
  listing: Listing,
  Params(p): Params<ListingParams>,
) -> Result<Json<Slice<PersonRecord>>, ApiError> {
  let filter = listing.filter(&p)?;
  let pagination = Pagination::offset(p.page.unwrap_or(0), p.size())?;
  Ok(Json(app.query.list(&filter, pagination).await?))
}

/// `GET {path}/cursor?after_id&size`
pub async fn cursor<S: RecordStore>(
  State(app): State<AppState<S>>,
  listing: Listing,
  Params(p): Params<ListingParams>,
) -> Result<Json<Slice<PersonRecord>>, ApiError> {
  let filter = listing.filter(&p)?;
  let pagination = Pagination::keyset(p.after_id.unwrap_or(0), p.size())?;
  Ok(Json(app.query.list(&filter, pagination).await?))
}

/// `GET {path}/count`
pub async fn count<S: RecordStore>(
  State(app): State<AppState<S>>,
  listing: Listing,
  Params(p): Params<ListingParams>,
) -> Result<Json<u64>, ApiError> {
  let filter = listing.filter(&p)?;
  Ok(Json(app.query.count(&filter).await?))
}

/// `GET /persons/paged?page&size`
pub async fn paged<S: RecordStore>(
  State(app): State<AppState<S>>,
  Params(p): Params<ListingParams>,
) -> Result<Json<Page<PersonRecord>>, ApiError> {
  let page = app
    .query
    .list_with_total(&Filter::All, p.page.unwrap_or(0), p.size())
    .await?;
  Ok(Json(page))
}
