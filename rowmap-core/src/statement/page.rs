//! Page window arithmetic

use super::{Statement, StatementBuilder};

/// Page size used when the caller passes zero or less
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Normalized paging request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub record_count: u64,
    pub page_count: u64,
    /// 1-based, clamped into `[1, page_count]`
    pub page_index: u64,
    pub page_size: u64,
    /// Rows before the page
    pub start: u64,
    /// Rows up to and including the page
    pub end: u64,
}

/// Normalize `page_index` and `page_size` against `record_count` rows.
/// A size of zero or less falls back to `default_size`.
pub fn page_window(record_count: u64, page_index: i64, page_size: i64, default_size: u64) -> PageWindow {
    let page_size = if page_size <= 0 {
        default_size.max(1)
    } else {
        page_size as u64
    };
    let page_count = record_count.div_ceil(page_size);
    let page_index = (page_index.max(1) as u64).min(page_count.max(1));
    PageWindow {
        record_count,
        page_count,
        page_index,
        page_size,
        start: (page_index - 1) * page_size,
        end: page_index * page_size,
    }
}

/// Query returning the number of rows `inner` produces
pub fn count_wrapper(inner: &str) -> String {
    format!("SELECT COUNT(1) FROM ({}) t", inner)
}

impl StatementBuilder<'_> {
    /// Row count query for `inner`, sharing its parameters
    pub fn page_count(&self, inner: &Statement) -> Statement {
        Statement::new(count_wrapper(&inner.sql), inner.parameters.clone())
    }

    /// `inner` restricted to the rows of `window`, ordered by `order`
    pub fn page_rows(&self, inner: &Statement, order: Option<&str>, window: &PageWindow) -> Statement {
        Statement::new(
            self.dialect.paginate(&inner.sql, order, window.start, window.end),
            inner.parameters.clone(),
        )
    }
}
