//! Free-form search query parsing
//!
//! Turns input such as `"Dune" year:1960-1970 alph page=2 pageSize=5` into a
//! [`SearchRequest`]. The input is first split into tokens by [`tokenize`], then
//! [`parse_query`] walks the token stream looking for the known token kinds:
//!
//! - `"..."`: the title (first quoted substring, required)
//! - `year:YYYY-YYYY`: inclusive year range
//! - `year<YYYY`, `year>YYYY`, `year=YYYY`: single-sided year filter
//! - `dec`, `alph`: sort order (any bare word containing them)
//! - `page=N`, `pageSize=N`: pagination
//! - `limit=N`: cap on the number of results
//!
//! Keys are case-insensitive, token order does not matter, and only the first
//! occurrence of each token kind is honored. Words inside the title never count
//! as tokens. Anything else is ignored.

use serde::{Deserialize, Serialize};

use crate::pagination::DEFAULT_PAGE_SIZE;

/// Lowest year accepted by a year filter
pub const MIN_YEAR: i64 = 1000;

/// Error type for query parsing
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Missing title: put the book title between double quotes, e.g. '\"Dune\" year>1960'")]
    MissingTitle,

    #[error("Invalid year {0}: use a four-digit year from 1000 onwards")]
    InvalidYear(String),

    #[error("Invalid page {0}: page must be a positive number")]
    InvalidPage(String),

    #[error("Invalid page size {0}: pageSize must be a positive number")]
    InvalidPageSize(String),

    #[error("Invalid limit {0}: limit must be a positive number")]
    InvalidLimit(String),
}

/// Comparison used by a single-sided year filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearOp {
    #[serde(rename = "lt")]
    Before,
    #[serde(rename = "gt")]
    After,
    #[serde(rename = "eq")]
    In,
}

impl YearOp {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '<' => Some(YearOp::Before),
            '>' => Some(YearOp::After),
            '=' => Some(YearOp::In),
            _ => None,
        }
    }

    /// Whether `year` satisfies `year OP bound`
    pub fn matches(self, year: i64, bound: i64) -> bool {
        match self {
            YearOp::Before => year < bound,
            YearOp::After => year > bound,
            YearOp::In => year == bound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    None,
    Single {
        op: YearOp,
        year: i64,
    },
    /// Inclusive range, always with `start <= end`
    Range {
        start: i64,
        end: i64,
    },
}

impl YearFilter {
    /// Range filter with validated endpoints, swapped when given backwards
    pub fn range(start: i64, end: i64) -> Result<Self, QueryError> {
        for year in [start, end] {
            if year < MIN_YEAR {
                return Err(QueryError::InvalidYear(year.to_string()));
            }
        }
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        Ok(YearFilter::Range { start, end })
    }

    /// Single-sided filter with a validated year
    ///
    /// `year=1000` is accepted, but `<` and `>` reject the boundary year itself:
    /// `year>1000` and `year<1000` describe no useful four-digit year.
    pub fn single(op: YearOp, year: i64) -> Result<Self, QueryError> {
        let too_early = match op {
            YearOp::In => year < MIN_YEAR,
            YearOp::Before | YearOp::After => year <= MIN_YEAR,
        };
        if too_early {
            return Err(QueryError::InvalidYear(year.to_string()));
        }
        Ok(YearFilter::Single { op, year })
    }

    /// Human-readable description, e.g. "Published before 1990"
    pub fn describe(&self) -> Option<String> {
        match self {
            YearFilter::None => None,
            YearFilter::Single { op, year } => Some(match op {
                YearOp::Before => format!("Published before {year}"),
                YearOp::After => format!("Published after {year}"),
                YearOp::In => format!("Published in {year}"),
            }),
            YearFilter::Range { start, end } => {
                Some(format!("Published between {start} and {end}"))
            }
        }
    }

    /// Whether a book published in `year` passes the filter
    ///
    /// Books with an unknown year only pass when there is no filter.
    pub fn matches(&self, year: Option<i64>) -> bool {
        match (self, year) {
            (YearFilter::None, _) => true,
            (_, None) => false,
            (YearFilter::Single { op, year: bound }, Some(year)) => op.matches(year, *bound),
            (YearFilter::Range { start, end }, Some(year)) => (*start..=*end).contains(&year),
        }
    }
}

/// Result ordering requested from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending by first publish year
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Descending by first publish year
    #[serde(rename = "desc")]
    Descending,
    /// By title
    #[serde(rename = "alpha")]
    Alphabetical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    #[default]
    Disabled,
    Enabled {
        page: usize,
        page_size: usize,
    },
}

/// Structured search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub title: String,
    pub year_filter: YearFilter,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// Request for `title` with every option left at its default
    pub fn new(title: impl Into<String>) -> Self {
        SearchRequest {
            title: title.into(),
            year_filter: YearFilter::None,
            sort_order: SortOrder::Default,
            pagination: Pagination::Disabled,
            limit: None,
        }
    }

    /// Query parameters sent to the search API
    pub fn to_params(&self) -> SearchParams {
        let mut params = SearchParams {
            q: Some(self.title.clone()),
            ..SearchParams::default()
        };

        match self.year_filter {
            YearFilter::None => {}
            YearFilter::Single { op, year } => {
                params.year_op = Some(op);
                params.year = Some(year);
            }
            YearFilter::Range { start, end } => {
                params.year_from = Some(start);
                params.year_to = Some(end);
            }
        }

        if self.sort_order != SortOrder::Default {
            params.sort = Some(self.sort_order);
        }

        if let Pagination::Enabled { page, page_size } = self.pagination {
            params.page = Some(page as i64);
            params.page_size = Some(page_size as i64);
        }

        params.limit = self.limit.map(|limit| limit as i64);
        params
    }
}

/// Search API query parameters
///
/// This is the URL form of a [`SearchRequest`], shared by the client that
/// builds the request URL and the server that decodes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_op: Option<YearOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SearchParams {
    /// `(name, value)` pairs in a stable order, ready to be URL-encoded
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(op) = self.year_op {
            let op = match op {
                YearOp::Before => "lt",
                YearOp::After => "gt",
                YearOp::In => "eq",
            };
            pairs.push(("year_op", op.to_string()));
        }
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(year) = self.year_from {
            pairs.push(("year_from", year.to_string()));
        }
        if let Some(year) = self.year_to {
            pairs.push(("year_to", year.to_string()));
        }
        if let Some(sort) = self.sort {
            let sort = match sort {
                SortOrder::Default => "default",
                SortOrder::Descending => "desc",
                SortOrder::Alphabetical => "alpha",
            };
            pairs.push(("sort", sort.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        pairs
    }
}

impl TryFrom<SearchParams> for SearchRequest {
    type Error = QueryError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let title = params
            .q
            .map(|q| q.trim().trim_matches('"').trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(QueryError::MissingTitle)?;

        let year_filter = match (params.year_from, params.year_to, params.year_op, params.year) {
            (Some(start), Some(end), _, _) => YearFilter::range(start, end)?,
            (_, _, Some(op), Some(year)) => YearFilter::single(op, year)?,
            _ => YearFilter::None,
        };

        let page_size = match params.page_size {
            Some(size) => positive(size, QueryError::InvalidPageSize)?,
            None => DEFAULT_PAGE_SIZE,
        };
        let pagination = match params.page {
            Some(page) => Pagination::Enabled {
                page: positive(page, QueryError::InvalidPage)?,
                page_size,
            },
            None => Pagination::Disabled,
        };

        let limit = params
            .limit
            .map(|limit| positive(limit, QueryError::InvalidLimit))
            .transpose()?;

        Ok(SearchRequest {
            title,
            year_filter,
            sort_order: params.sort.unwrap_or_default(),
            pagination,
            limit,
        })
    }
}

fn positive(value: i64, err: fn(String) -> QueryError) -> Result<usize, QueryError> {
    if value > 0 {
        usize::try_from(value).map_err(|_| err(value.to_string()))
    } else {
        Err(err(value.to_string()))
    }
}

/// Resolve a scanned number, reporting values too large for `i64` as written
fn resolve(raw: Number, err: fn(String) -> QueryError) -> Result<i64, QueryError> {
    raw.map_err(err)
}

/// Lexical token of a free-form query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text between a pair of double quotes, quotes excluded
    Quoted(&'a str),
    /// A run of characters that are neither whitespace, quotes, nor symbols
    Word(&'a str),
    /// One of `<`, `>`, `=`, `:`, `-`
    Symbol(char),
}

fn is_symbol(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | ':' | '-')
}

/// Split a free-form query into tokens
///
/// An opening quote without a closing one is dropped and the text after it is
/// tokenized normally.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        if c == '"' {
            let body = start + 1;
            if let Some(len) = input[body..].find('"') {
                tokens.push(Token::Quoted(&input[body..body + len]));
                for (idx, _) in chars.by_ref() {
                    if idx == body + len {
                        break;
                    }
                }
            }
            continue;
        }

        if is_symbol(c) {
            tokens.push(Token::Symbol(c));
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_whitespace() || next == '"' || is_symbol(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }
        tokens.push(Token::Word(&input[start..end]));
    }

    tokens
}

/// A scanned integer, or its raw text when it does not fit in an `i64`
type Number = Result<i64, String>;

/// Every token kind found while scanning, first occurrence only
#[derive(Debug, Default)]
struct Scan<'a> {
    title: Option<&'a str>,
    range: Option<(Number, Number)>,
    single: Option<(YearOp, Number)>,
    descending: bool,
    alphabetical: bool,
    page: Option<Number>,
    page_size: Option<Number>,
    limit: Option<Number>,
    ignored: Vec<&'a str>,
}

/// Cursor over a token stream
struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'a> Cursor<'_, 'a> {
    fn peek(&self, offset: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + offset).copied()
    }

    /// Signed integer starting at `offset`; returns the value and how many
    /// tokens it spans
    fn number(&self, offset: usize) -> Option<(Number, usize)> {
        match self.peek(offset)? {
            Token::Symbol('-') => match self.peek(offset + 1)? {
                Token::Word(digits) => parse_digits(digits, true).map(|n| (n, 2)),
                _ => None,
            },
            Token::Word(digits) => parse_digits(digits, false).map(|n| (n, 1)),
            _ => None,
        }
    }

    /// `year:YYYY-YYYY`, with the cursor on `year`
    fn year_range(&self) -> Option<((Number, Number), usize)> {
        if self.peek(1)? != Token::Symbol(':') {
            return None;
        }
        let (start, start_len) = self.number(2)?;
        if self.peek(2 + start_len)? != Token::Symbol('-') {
            return None;
        }
        let (end, end_len) = self.number(3 + start_len)?;
        Some(((start, end), 3 + start_len + end_len))
    }

    /// `year OP YYYY`, with the cursor on `year`
    fn year_single(&self) -> Option<((YearOp, Number), usize)> {
        let op = match self.peek(1)? {
            Token::Symbol(symbol) => YearOp::from_symbol(symbol)?,
            _ => return None,
        };
        let (year, len) = self.number(2)?;
        Some(((op, year), 2 + len))
    }

    /// `key=N`, with the cursor on `key`
    fn assignment(&self) -> Option<(Number, usize)> {
        if self.peek(1)? != Token::Symbol('=') {
            return None;
        }
        let (value, len) = self.number(2)?;
        Some((value, 2 + len))
    }
}

/// `None` when `word` is not a run of ASCII digits
fn parse_digits(word: &str, negative: bool) -> Option<Number> {
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let text = if negative {
        format!("-{word}")
    } else {
        word.to_string()
    };
    Some(text.parse::<i64>().map_err(|_| text))
}

fn scan<'a>(tokens: &[Token<'a>]) -> Scan<'a> {
    let mut found = Scan::default();
    let mut cursor = Cursor { tokens, pos: 0 };

    while let Some(token) = cursor.peek(0) {
        let word = match token {
            Token::Quoted(text) => {
                found.title.get_or_insert(text);
                cursor.pos += 1;
                continue;
            }
            Token::Symbol(_) => {
                cursor.pos += 1;
                continue;
            }
            Token::Word(word) => word,
        };

        let key = word.to_ascii_lowercase();
        let consumed = match key.as_str() {
            "year" => {
                if let Some((range, len)) = cursor.year_range() {
                    found.range.get_or_insert(range);
                    Some(len)
                } else if let Some((single, len)) = cursor.year_single() {
                    found.single.get_or_insert(single);
                    Some(len)
                } else {
                    None
                }
            }
            "page" => cursor.assignment().map(|(value, len)| {
                found.page.get_or_insert(value);
                len
            }),
            "pagesize" => cursor.assignment().map(|(value, len)| {
                found.page_size.get_or_insert(value);
                len
            }),
            "limit" => cursor.assignment().map(|(value, len)| {
                found.limit.get_or_insert(value);
                len
            }),
            _ => None,
        };

        match consumed {
            Some(len) => cursor.pos += len,
            None => {
                let descending = key.contains("dec");
                let alphabetical = key.contains("alph");
                found.descending |= descending;
                found.alphabetical |= alphabetical;
                if !descending && !alphabetical {
                    log::debug!("Ignoring unrecognised query word {word:?}");
                    found.ignored.push(word);
                }
                cursor.pos += 1;
            }
        }
    }

    found
}

/// Parse a free-form query into a [`SearchRequest`]
///
/// Fails with the first problem found, checked in this order: title, year
/// filter, page, page size, limit.
pub fn parse_query(input: &str) -> Result<SearchRequest, QueryError> {
    let tokens = tokenize(input);
    let found = scan(&tokens);

    let title = found
        .title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or(QueryError::MissingTitle)?;

    let year_filter = match (found.range, found.single) {
        (Some((start, end)), _) => YearFilter::range(
            resolve(start, QueryError::InvalidYear)?,
            resolve(end, QueryError::InvalidYear)?,
        )?,
        (None, Some((op, year))) => {
            YearFilter::single(op, resolve(year, QueryError::InvalidYear)?)?
        }
        (None, None) => YearFilter::None,
    };

    // Alphabetical is applied last, so it wins when both are present.
    let mut sort_order = SortOrder::Default;
    if found.descending {
        sort_order = SortOrder::Descending;
    }
    if found.alphabetical {
        sort_order = SortOrder::Alphabetical;
    }

    let page = found
        .page
        .map(|page| {
            positive(
                resolve(page, QueryError::InvalidPage)?,
                QueryError::InvalidPage,
            )
        })
        .transpose()?;
    let page_size = found
        .page_size
        .map(|size| {
            positive(
                resolve(size, QueryError::InvalidPageSize)?,
                QueryError::InvalidPageSize,
            )
        })
        .transpose()?
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let pagination = match page {
        Some(page) => Pagination::Enabled { page, page_size },
        None => Pagination::Disabled,
    };

    let limit = found
        .limit
        .map(|limit| {
            positive(
                resolve(limit, QueryError::InvalidLimit)?,
                QueryError::InvalidLimit,
            )
        })
        .transpose()?;

    Ok(SearchRequest {
        title: title.to_string(),
        year_filter,
        sort_order,
        pagination,
        limit,
    })
}
