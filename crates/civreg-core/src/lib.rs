//! Core types, services and the storage trait for the civil registry.
//!
//! No HTTP or database code lives here. Backends implement
//! [`store::RecordStore`]; adapters call [`QueryService`] and
//! [`LifecycleService`].

// Store impls use native `async fn`; the trait spells out the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod page;
pub mod person;
pub mod predicate;
pub mod query;
pub mod store;
pub mod uniqueness;

#[cfg(test)]
mod tests;

pub use error::{Error, ErrorKind, Result};
pub use lifecycle::LifecycleService;
pub use query::{Filter, QueryService};

/// The current calendar day in UTC.
pub fn today() -> chrono::NaiveDate { chrono::Utc::now().date_naive() }
