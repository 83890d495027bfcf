//! API error type, the error envelope and its request-path middleware.

use axum::{
  Json,
  extract::{
    Request,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use civreg_core::ErrorKind;
use serde::Serialize;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] civreg_core::Error),

  /// A required parameter was absent.
  #[error("missing parameter: {0}")]
  MissingParam(&'static str),

  #[error("malformed request body: {}", .0.body_text())]
  Body(#[from] JsonRejection),

  #[error("malformed query string: {}", .0.body_text())]
  Query(#[from] QueryRejection),

  #[error("malformed path: {}", .0.body_text())]
  Path(#[from] PathRejection),
}

impl ApiError {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::MissingParam(_) | Self::Body(_) | Self::Query(_) | Self::Path(_) => {
        ErrorKind::Validation
      }
    }
  }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
  pub message:   String,
  pub status:    u16,
  pub timestamp: DateTime<Utc>,
  /// Filled in by [`attach_path`]; absent when the middleware is not mounted.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path:      Option<String>,
}

fn status_of(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let status = status_of(kind);
    let message = if kind == ErrorKind::Internal {
      tracing::error!(error = %self, "internal error");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };

    let body = ErrorBody {
      message,
      status: status.as_u16(),
      timestamp: Utc::now(),
      path: None,
    };
    let mut res = (status, Json(body.clone())).into_response();
    res.extensions_mut().insert(body);
    res
  }
}

/// Middleware stamping the originating request path into error envelopes.
pub async fn attach_path(req: Request, next: Next) -> Response {
  let path = req.uri().path().to_owned();
  let res = next.run(req).await;

  match res.extensions().get::<ErrorBody>() {
    Some(body) => {
      let body = ErrorBody { path: Some(path), ..body.clone() };
      (res.status(), Json(body)).into_response()
    }
    None => res,
  }
}
