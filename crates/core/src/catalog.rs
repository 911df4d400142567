//! Search API result shaping
//!
//! Pure functions used by `bookfinder serve` to turn the raw Open Library
//! documents into the `{ total, books }` response: title matching, year
//! filtering, sorting, limiting and paging, in that order.

use std::cmp::Ordering;

use crate::books::{BookSummary, SearchResponse};
use crate::pagination::page_bounds;
use crate::query::{Pagination, SearchRequest, SortOrder};

/// Whether the book title contains `needle`, ignoring case
///
/// Open Library also returns books that match on other fields, so results are
/// narrowed down to titles that actually contain the searched name.
pub fn title_matches(book: &BookSummary, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    book.title
        .as_deref()
        .is_some_and(|title| title.to_lowercase().contains(&needle))
}

/// Unknown years sort after every known year, whatever the direction
fn compare_years(a: Option<i64>, b: Option<i64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of `books` in the requested order
pub fn sort_books(books: &mut [BookSummary], order: SortOrder) {
    match order {
        SortOrder::Default => {
            books.sort_by(|a, b| compare_years(a.known_year(), b.known_year(), false))
        }
        SortOrder::Descending => {
            books.sort_by(|a, b| compare_years(a.known_year(), b.known_year(), true))
        }
        SortOrder::Alphabetical => books.sort_by_cached_key(|book| {
            book.title
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_default()
        }),
    }
}

/// Build the API response for `request` out of the upstream documents
///
/// `total` counts the matching books after the limit is applied, so the
/// client's page arithmetic agrees with what it can actually fetch. A page past
/// the end yields no books and the same total.
pub fn build_response(docs: Vec<BookSummary>, request: &SearchRequest) -> SearchResponse {
    let mut books: Vec<BookSummary> = docs
        .into_iter()
        .filter(|book| title_matches(book, &request.title))
        .filter(|book| request.year_filter.matches(book.known_year()))
        .collect();

    sort_books(&mut books, request.sort_order);

    if let Some(limit) = request.limit {
        books.truncate(limit);
    }

    let total = books.len();

    if let Pagination::Enabled { page, page_size } = request.pagination {
        let (start, end) = page_bounds(total, page, page_size);
        books = books.drain(start..end).collect();
    }

    SearchResponse { total, books }
}
