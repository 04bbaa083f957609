//! Page ↔ row range arithmetic.
//!
//! Pure functions, no I/O. Pages are 1-based, row offsets 0-based, and
//! ranges inclusive on both ends to match PostgREST's `Range` semantics.

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Inclusive row range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub from: u64,
    pub to: u64,
}

impl PageRange {
    /// Number of rows covered by the range.
    pub fn row_count(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Row range for `page`: `from = (page-1)*page_size`, `to = from + page_size - 1`.
///
/// A page below 1 is clamped to 1; a zero page size is treated as 1.
pub fn range_for(page: u32, page_size: u32) -> PageRange {
    let page = u64::from(page.max(1));
    let page_size = u64::from(page_size.max(1));
    let from = (page - 1) * page_size;
    PageRange {
        from,
        to: from + page_size - 1,
    }
}

/// `ceil(total / page_size)`, zero when `total` is zero.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total.div_ceil(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, total_pages]`.
///
/// With no pages at all the only valid page is 1.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Extract the exact row count from a `Content-Range` header
/// (`0-11/13`, `*/0`). Returns `None` when the count is unknown (`*`).
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
