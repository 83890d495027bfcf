//! Pagination: offset slices, keyset cursors and the legacy counted page.
//!
//! Both strategies order by ascending id and detect "more data" by fetching
//! one row past the requested size. Neither keeps server-side state.

use serde::Serialize;

use crate::{Error, Result};

/// Page sizes above this are clamped, whatever the caller asked for.
pub const MAX_PAGE_SIZE: u32 = 25;

/// A validated, clamped page size in `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
  /// Non-positive sizes are rejected; oversized requests are clamped.
  pub fn new(requested: i64) -> Result<Self> {
    if requested <= 0 {
      return Err(Error::validation("size", "must be greater than zero"));
    }
    Ok(Self(requested.min(i64::from(MAX_PAGE_SIZE)) as u32))
  }

  pub fn get(self) -> u32 { self.0 }

  /// Rows to fetch: one extra for the look-ahead.
  pub fn fetch_limit(self) -> u32 { self.0 + 1 }
}

impl Default for PageSize {
  fn default() -> Self { Self(MAX_PAGE_SIZE) }
}

/// How a scan is windowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
  /// Zero-based page index; skips `page * size` matching rows.
  Offset { page: u32, size: PageSize },
  /// Rows with `id > after_id`. `after_id = 0` starts from the beginning.
  Keyset { after_id: i64, size: PageSize },
}

impl Pagination {
  pub fn offset(page: i64, size: i64) -> Result<Self> {
    let size = PageSize::new(size)?;
    let page = u32::try_from(page)
      .map_err(|_| Error::validation("page", format!("must be between 0 and {}", u32::MAX)))?;
    Ok(Self::Offset { page, size })
  }

  pub fn keyset(after_id: i64, size: i64) -> Result<Self> {
    let size = PageSize::new(size)?;
    if after_id < 0 {
      return Err(Error::validation("after_id", "must not be negative"));
    }
    Ok(Self::Keyset { after_id, size })
  }

  pub fn size(&self) -> PageSize {
    match self {
      Self::Offset { size, .. } | Self::Keyset { size, .. } => *size,
    }
  }

  /// Rows to skip before the window; always zero for keyset scans.
  pub fn skip(&self) -> u64 {
    match self {
      Self::Offset { page, size } => u64::from(*page) * u64::from(size.get()),
      Self::Keyset { .. } => 0,
    }
  }
}

/// One window of results with a look-ahead `has_next` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<T> {
  pub items:         Vec<T>,
  pub has_next:      bool,
  pub size:          u32,
  /// Set for offset slices.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page:          Option<u32>,
  /// Set for keyset slices that have a successor: pass it back as `after_id`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_after_id: Option<i64>,
}

impl<T> Slice<T> {
  /// Build a slice from up to `size + 1` fetched rows, dropping the
  /// look-ahead row. `key` yields the ordering id of a row.
  pub fn from_lookahead(
    mut rows: Vec<T>,
    pagination: Pagination,
    key: impl Fn(&T) -> i64,
  ) -> Self {
    let size = pagination.size().get();
    let has_next = rows.len() > size as usize;
    rows.truncate(size as usize);

    let (page, next_after_id) = match pagination {
      Pagination::Offset { page, .. } => (Some(page), None),
      Pagination::Keyset { .. } => {
        (None, if has_next { rows.last().map(&key) } else { None })
      }
    };

    Self { items: rows, has_next, size, page, next_after_id }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
    Slice {
      items:         self.items.into_iter().map(f).collect(),
      has_next:      self.has_next,
      size:          self.size,
      page:          self.page,
      next_after_id: self.next_after_id,
    }
  }
}

/// An offset window together with the total number of matching rows.
///
/// Computing `total_elements` costs a full count; only the explicitly
/// counted listing produces this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
  pub items:          Vec<T>,
  pub page:           u32,
  pub size:           u32,
  pub total_elements: u64,
  pub total_pages:    u64,
  pub has_next:       bool,
}

impl<T> Page<T> {
  pub fn from_slice(slice: Slice<T>, total_elements: u64) -> Self {
    let size = u64::from(slice.size);
    Self {
      total_pages: total_elements.div_ceil(size),
      page: slice.page.unwrap_or(0),
      size: slice.size,
      has_next: slice.has_next,
      items: slice.items,
      total_elements,
    }
  }
}
