//! Handlers for single-record endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/persons` | Body: [`NewPerson`]; returns 201 + stored record |
//! | `GET`   | `/persons/by-id/{id}` | 404 if not found |
//! | `GET`   | `/persons/by-national-id/{nid}` | 404 if not found |
//! | `GET`   | `/persons/by-id/{id}/is-alive` | `true` / `false` |
//! | `PATCH` | `/persons/by-id/{id}/mark-deceased` | Body: `{"death_date":"YYYY-MM-DD"}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use civreg_core::{
  lifecycle::DeathRecord,
  person::{NewPerson, PersonRecord},
  store::RecordStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  error::ApiError,
  extract::{Body, PathParam},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /persons`
pub async fn create<S: RecordStore>(
  State(app): State<AppState<S>>,
  Body(body): Body<NewPerson>,
) -> Result<impl IntoResponse, ApiError> {
  let record = app.lifecycle.create(body).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Lookups ──────────────────────────────────────────────────────────────────

/// `GET /persons/by-id/{id}`
pub async fn get_by_id<S: RecordStore>(
  State(app): State<AppState<S>>,
  PathParam(id): PathParam<i64>,
) -> Result<Json<PersonRecord>, ApiError> {
  Ok(Json(app.query.get_by_id(id).await?))
}

/// `GET /persons/by-national-id/{nid}`
pub async fn get_by_national_id<S: RecordStore>(
  State(app): State<AppState<S>>,
  PathParam(nid): PathParam<String>,
) -> Result<Json<PersonRecord>, ApiError> {
  Ok(Json(app.query.get_by_national_id(&nid).await?))
}

/// `GET /persons/by-id/{id}/is-alive`
pub async fn is_alive<S: RecordStore>(
  State(app): State<AppState<S>>,
  PathParam(id): PathParam<i64>,
) -> Result<Json<bool>, ApiError> {
  Ok(Json(app.query.is_alive(id).await?))
}

// ─── Death transition ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MarkDeceasedBody {
  pub death_date: NaiveDate,
}

/// `PATCH /persons/by-id/{id}/mark-deceased`
pub async fn mark_deceased<S: RecordStore>(
  State(app): State<AppState<S>>,
  PathParam(id): PathParam<i64>,
  Body(body): Body<MarkDeceasedBody>,
) -> Result<Json<DeathRecord>, ApiError> {
  Ok(Json(app.lifecycle.mark_deceased(id, body.death_date).await?))
}
