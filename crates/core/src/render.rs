//! Search result rendering
//!
//! Turns a [`SearchResponse`] into the lines printed on the terminal. Lines are
//! tagged with a [`LineKind`] so the shell can style them; the core only deals
//! in plain text.

use std::fmt;

use crate::books::{BookSummary, SearchResponse};
use crate::pagination::{displayed_range, total_pages};
use crate::query::{Pagination, SearchRequest};

/// Error type for rendering
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Page {page} is out of range. Only {total_pages} pages available.")]
    PageOutOfRange { page: usize, total_pages: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    NoResults,
    Header,
    Navigation,
    Range,
    EntryTitle,
    EntryDetail,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Line {
            kind,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Line::new(LineKind::Blank, "")
    }
}

/// Rendered search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub lines: Vec<Line>,
}

impl Rendered {
    /// Number of formatted book entries
    pub fn entry_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::EntryTitle)
            .count()
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

pub fn format_authors(book: &BookSummary) -> String {
    match &book.authors {
        Some(authors) if !authors.is_empty() => authors.join(", "),
        _ => "Unknown Author".to_string(),
    }
}

pub fn format_year(book: &BookSummary) -> String {
    book.known_year()
        .map(|year| year.to_string())
        .unwrap_or_else(|| "Unknown Year".to_string())
}

pub fn format_languages(book: &BookSummary) -> String {
    match &book.languages {
        Some(languages) if !languages.is_empty() => languages.join(", "),
        _ => "Unknown languages".to_string(),
    }
}

/// Format one book as a numbered entry followed by a blank separator line
pub fn format_book(number: usize, book: &BookSummary) -> Vec<Line> {
    let title = book.title.as_deref().unwrap_or("Unknown Title");

    vec![
        Line::new(LineKind::EntryTitle, format!("{number}. {title}")),
        Line::new(
            LineKind::EntryDetail,
            format!("    - authors: {}", format_authors(book)),
        ),
        Line::new(
            LineKind::EntryDetail,
            format!("    - publish year: {}", format_year(book)),
        ),
        Line::new(
            LineKind::EntryDetail,
            format!("    - available languages: {}", format_languages(book)),
        ),
        Line::blank(),
    ]
}

fn header(total: usize, request: &SearchRequest) -> Line {
    let noun = if total == 1 { "book" } else { "books" };
    let text = match request.year_filter.describe() {
        Some(filter) => format!(
            "Found {total} {noun} matching \"{}\" ({filter}):",
            request.title
        ),
        None => format!("Found {total} {noun} matching \"{}\":", request.title),
    };
    Line::new(LineKind::Header, text)
}

fn navigation(page: usize, total_pages: usize) -> Line {
    let text = if total_pages <= 1 {
        "This is the only page of results.".to_string()
    } else if page < total_pages {
        format!("Page {page} of {total_pages}. Use page={} to see the next page.", page + 1)
    } else {
        format!(
            "Page {page} of {total_pages} (last page). Use page={} to see the previous page.",
            page - 1
        )
    };
    Line::new(LineKind::Navigation, text)
}

/// Render a search response for the request that produced it
///
/// A paginated request for a page past the last one fails with
/// [`RenderError::PageOutOfRange`]. An empty response renders a single
/// "no results" line. A `total` smaller than the number of books returned is
/// raised to that number.
pub fn render(response: &SearchResponse, request: &SearchRequest) -> Result<Rendered, RenderError> {
    let total = response.total.max(response.books.len());

    if let Pagination::Enabled { page, page_size } = request.pagination {
        let total_pages = total_pages(total, page_size);
        if total > 0 && page > total_pages {
            return Err(RenderError::PageOutOfRange { page, total_pages });
        }
    }

    if response.books.is_empty() {
        return Ok(Rendered {
            lines: vec![Line::new(
                LineKind::NoResults,
                format!("No books found matching \"{}\".", request.title),
            )],
        });
    }

    let mut lines = vec![header(total, request)];

    let first_number = match request.pagination {
        Pagination::Disabled => {
            lines.push(Line::blank());
            1
        }
        Pagination::Enabled { page, page_size } => {
            let (first, last) = displayed_range(page, page_size, response.books.len(), total);
            lines.push(navigation(page, total_pages(total, page_size)));
            lines.push(Line::new(
                LineKind::Range,
                format!("Showing books {first}-{last} of {total}"),
            ));
            lines.push(Line::blank());
            first
        }
    };

    for (idx, book) in response.books.iter().enumerate() {
        lines.extend(format_book(first_number + idx, book));
    }

    Ok(Rendered { lines })
}
