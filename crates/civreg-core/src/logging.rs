//! Call logging for service operations.
//!
//! Every public service operation runs through [`logged`], which traces entry,
//! completion and classified failure. Nothing in the core logs anywhere else.

use std::{future::Future, time::Instant};

use crate::{ErrorKind, Result};

/// Run `call` as the operation named `op`, tracing its outcome.
pub async fn logged<T>(op: &'static str, call: impl Future<Output = Result<T>>) -> Result<T> {
  tracing::debug!(op, "service call started");
  let started = Instant::now();

  let result = call.await;
  let elapsed_ms = started.elapsed().as_millis() as u64;

  match &result {
    Ok(_) => tracing::debug!(op, elapsed_ms, "service call completed"),
    Err(e) if e.kind() == ErrorKind::Internal => {
      tracing::error!(op, elapsed_ms, error = %e, "service call failed");
    }
    Err(e) => {
      tracing::warn!(op, elapsed_ms, kind = ?e.kind(), error = %e, "service call rejected");
    }
  }
  result
}
