use serde::{Deserialize, Serialize};

/// A single book as returned by the search API
///
/// Every field may be missing or `null` on the wire. The field names follow the
/// Open Library search document format, which the API passes through unchanged.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct BookSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "author_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i64>,
    #[serde(rename = "language", default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

impl BookSummary {
    /// Publish year, if it is known and positive
    pub fn known_year(&self) -> Option<i64> {
        self.first_publish_year.filter(|year| *year > 0)
    }
}

/// Search API response
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub total: usize,
    pub books: Vec<BookSummary>,
}

/// Accepted response shapes: the paged object, or a bare array of books
#[derive(Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Paged {
        total: Option<usize>,
        books: Vec<BookSummary>,
    },
    Bare(Vec<BookSummary>),
}

impl<'de> Deserialize<'de> for SearchResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match WireResponse::deserialize(deserializer)? {
            WireResponse::Paged { total, books } => SearchResponse {
                total: total.unwrap_or(books.len()),
                books,
            },
            WireResponse::Bare(books) => SearchResponse {
                total: books.len(),
                books,
            },
        })
    }
}

/// Open Library `search.json` response (only the fields we read)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OpenLibraryResponse {
    #[serde(default)]
    pub docs: Vec<BookSummary>,
}

/// Decode a search API response body
pub fn decode_response(body: &str) -> Result<SearchResponse, serde_json::Error> {
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_paged_response() {
        let body = r#"{
            "total": 2,
            "books": [
                {"title": "Dune", "author_name": ["Frank Herbert"], "first_publish_year": 1965, "language": ["eng", "spa"]},
                {"title": "Dune Messiah"}
            ]
        }"#;

        let response = decode_response(body).unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.books.len(), 2);
        assert_eq!(response.books[0].title.as_deref(), Some("Dune"));
        assert_eq!(
            response.books[0].authors,
            Some(vec!["Frank Herbert".to_string()])
        );
        assert_eq!(response.books[0].first_publish_year, Some(1965));
        assert_eq!(response.books[1].authors, None);
        assert_eq!(response.books[1].languages, None);
    }

    #[test]
    fn test_decode_bare_array() {
        let body = r#"[{"title": "Dune"}, {"title": "Children of Dune"}]"#;

        let response = decode_response(body).unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.books[1].title.as_deref(), Some("Children of Dune"));
    }

    #[test]
    fn test_decode_nulls() {
        let body = r#"{"total": 1, "books": [{"title": "X", "author_name": null, "first_publish_year": null, "language": null}]}"#;

        let response = decode_response(body).unwrap();

        assert_eq!(response.books[0].authors, None);
        assert_eq!(response.books[0].first_publish_year, None);
    }

    #[test]
    fn test_decode_missing_total_uses_book_count() {
        let body = r#"{"books": [{"title": "X"}]}"#;

        let response = decode_response(body).unwrap();

        assert_eq!(response.total, 1);
    }

    #[test]
    fn test_decode_invalid_body() {
        assert!(decode_response("not json").is_err());
        assert!(decode_response(r#""a string""#).is_err());
    }

    #[test]
    fn test_decode_object_without_books() {
        assert!(decode_response(r#"{"error": "upstream down"}"#).is_err());
        assert!(decode_response(r#"{"docs": [{"title": "Dune"}]}"#).is_err());
        assert!(decode_response(r#"{"total": 3}"#).is_err());
    }

    #[test]
    fn test_decode_empty_books() {
        let response = decode_response(r#"{"total": 0, "books": []}"#).unwrap();
        assert_eq!(response, SearchResponse::default());

        let response = decode_response("[]").unwrap();
        assert_eq!(response, SearchResponse::default());
    }

    #[test]
    fn test_known_year() {
        let mut book = BookSummary::default();
        assert_eq!(book.known_year(), None);

        book.first_publish_year = Some(0);
        assert_eq!(book.known_year(), None);

        book.first_publish_year = Some(1965);
        assert_eq!(book.known_year(), Some(1965));
    }

    #[test]
    fn test_open_library_ignores_extra_fields() {
        let body = r#"{"numFound": 1, "docs": [{"key": "/works/OL1W", "title": "Dune", "edition_count": 12}]}"#;

        let response: OpenLibraryResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.docs.len(), 1);
        assert_eq!(response.docs[0].title.as_deref(), Some("Dune"));
    }
}
