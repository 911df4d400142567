//! Page arithmetic
//!
//! Pure functions shared by the result renderer (which numbers and describes a
//! page) and the catalog (which slices the matching books into a page).
//! Pages are 1-indexed.

/// Page size used when pagination is requested without an explicit `pageSize`
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of pages needed to show `total` items, `page_size` at a time
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Zero-based index of the first item on `page`
pub fn page_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Calculate slice bounds for a given page
///
/// Returns `(start, end)` for slicing an array of `total` items. Pages past the
/// end produce an empty range at `total`.
pub fn page_bounds(total: usize, page: usize, page_size: usize) -> (usize, usize) {
    let start = page_offset(page, page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    (start, end)
}

/// One-based numbers of the first and last item shown on a page
///
/// `shown` is how many items the page actually holds; the last number never
/// exceeds `total`.
pub fn displayed_range(
    page: usize,
    page_size: usize,
    shown: usize,
    total: usize,
) -> (usize, usize) {
    let first = page_offset(page, page_size) + 1;
    let last = (first + shown).saturating_sub(1).min(total);
    (first, last)
}
