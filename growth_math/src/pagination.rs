//! Fixed-size page slicing for display
//!
//! Page numbers are 1-based. A series with no entries still has one (empty)
//! page so that navigation state is always valid.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Default number of entries shown per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of pages needed for `total_entries`, using ceiling division.
///
/// Never returns less than 1.
pub fn page_count(total_entries: usize, page_size: usize) -> Result<usize> {
    check_page_size(page_size)?;
    Ok(total_entries.div_ceil(page_size).max(1))
}

/// Slice out page `page_number` of `items`.
///
/// The last page holds the remainder and may be shorter than `page_size`.
/// Pages past the end yield an empty slice.
pub fn page<T>(items: &[T], page_number: usize, page_size: usize) -> Result<&[T]> {
    check_page_size(page_size)?;
    if page_number == 0 {
        return Err(MathError::InvalidInput(
            "Page numbers start at 1".to_string(),
        ));
    }

    let start = (page_number - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Ok(&[]);
    }
    let end = start.saturating_add(page_size).min(items.len());
    Ok(&items[start..end])
}

fn check_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(MathError::InvalidInput(
            "Page size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Description of one page of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: usize,
    pub page_size: usize,
    pub total_entries: usize,
}

impl Page {
    /// Total number of pages for this page's series
    pub fn page_count(&self) -> usize {
        // page_size is validated by the cursor that hands out pages
        self.total_entries.div_ceil(self.page_size.max(1)).max(1)
    }

    pub fn is_first(&self) -> bool {
        self.page_number <= 1
    }

    pub fn is_last(&self) -> bool {
        self.page_number >= self.page_count()
    }
}

/// Navigation state over a paginated series.
///
/// `next_page` and `prev_page` clamp at `[1, page_count]`; at a boundary they
/// leave the cursor where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    page_number: usize,
    page_size: usize,
    total_entries: usize,
}

impl PageCursor {
    /// Create a cursor on page 1 of an empty series
    pub fn new(page_size: usize) -> Result<Self> {
        check_page_size(page_size)?;
        Ok(Self {
            page_number: 1,
            page_size,
            total_entries: 0,
        })
    }

    /// Current 1-based page number
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    pub fn page_count(&self) -> usize {
        self.total_entries.div_ceil(self.page_size).max(1)
    }

    /// Update the series length, from the store or from a server-reported total.
    ///
    /// The current page is pulled back inside the new range if it fell off the end.
    pub fn set_total(&mut self, total_entries: usize) {
        self.total_entries = total_entries;
        self.page_number = self.page_number.clamp(1, self.page_count());
    }

    /// Advance one page, staying put on the last page
    pub fn next_page(&mut self) -> usize {
        if self.page_number < self.page_count() {
            self.page_number += 1;
        }
        self.page_number
    }

    /// Go back one page, staying put on the first page
    pub fn prev_page(&mut self) -> usize {
        if self.page_number > 1 {
            self.page_number -= 1;
        }
        self.page_number
    }

    /// Jump to a page, clamped into range
    pub fn go_to(&mut self, page_number: usize) -> usize {
        self.page_number = page_number.clamp(1, self.page_count());
        self.page_number
    }

    /// Snapshot of the current page
    pub fn current(&self) -> Page {
        Page {
            page_number: self.page_number,
            page_size: self.page_size,
            total_entries: self.total_entries,
        }
    }

    /// Slice the current page out of `items`
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        page(items, self.page_number, self.page_size).unwrap_or(&[])
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_entries: 0,
        }
    }
}
