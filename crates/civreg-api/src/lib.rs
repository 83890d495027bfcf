//! JSON REST API for the civil registry.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`]. Auth, TLS and
//! listener concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", civreg_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod extract;
pub mod listings;
pub mod persons;

use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  middleware,
  routing::{get, patch},
};
use civreg_core::{LifecycleService, QueryService, store::RecordStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
use extract::Params;
use listings::{Listing, ListingParams};

/// Services shared by all handlers.
pub struct AppState<S> {
  pub query:     QueryService<S>,
  pub lifecycle: LifecycleService<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { query: self.query.clone(), lifecycle: self.lifecycle.clone() }
  }
}

impl<S: RecordStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      query:     QueryService::new(store.clone()),
      lifecycle: LifecycleService::new(store),
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  let mut router = Router::new()
    // Single records
    .route("/persons/by-id/{id}", get(persons::get_by_id::<S>))
    .route("/persons/by-id/{id}/is-alive", get(persons::is_alive::<S>))
    .route("/persons/by-id/{id}/mark-deceased", patch(persons::mark_deceased::<S>))
    .route("/persons/by-national-id/{nid}", get(persons::get_by_national_id::<S>))
    // Counted listing
    .route("/persons/paged", get(listings::paged::<S>));

  // Filtered listings, each in slice, cursor and count form
  for (path, listing) in Listing::ROUTES {
    let slice = get(move |state: State<AppState<S>>, q: Params<ListingParams>| {
      listings::slice(state, listing, q)
    });
    let slice = if listing == Listing::All {
      slice.post(persons::create::<S>)
    } else {
      slice
    };
    router = router
      .route(path, slice)
      .route(
        &format!("{path}/cursor"),
        get(move |state: State<AppState<S>>, q: Params<ListingParams>| {
          listings::cursor(state, listing, q)
        }),
      )
      .route(
        &format!("{path}/count"),
        get(move |state: State<AppState<S>>, q: Params<ListingParams>| {
          listings::count(state, listing, q)
        }),
      );
  }

  router
    .layer(middleware::from_fn(error::attach_path))
    .layer(TraceLayer::new_for_http())
    .with_state(AppState::new(store))
}
