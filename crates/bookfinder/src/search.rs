use crate::prelude::{eprintln, println, *};
use bookfinder_core::books::{decode_response, SearchResponse};
use bookfinder_core::query::{parse_query, SearchRequest};
use bookfinder_core::render::{render, Line, LineKind, Rendered};
use colored::Colorize;

#[derive(Debug, clap::Args, Clone)]
#[command(after_help = "Quote the whole query so the shell keeps the title quotes and the < > signs:

  bookfinder search '\"Dune\" year:1960-1970 alph page=2 pageSize=5 limit=20'

Tokens: year:YYYY-YYYY, year<YYYY, year>YYYY, year=YYYY, dec, alph,
page=N, pageSize=N (default 10), limit=N")]
pub struct SearchOptions {
    /// Search query: a double-quoted title followed by optional tokens
    #[arg(value_name = "QUERY", required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Search API host
    #[arg(long, env = "API_HOST", default_value = "api")]
    pub host: String,

    /// Search API port
    #[arg(long, env = "API_PORT", default_value = "3000")]
    pub port: u16,

    /// Output the API response as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let input = options.query.join(" ");
    let request = parse_query(&input)?;
    log::debug!("Parsed query {input:?} into {request:?}");

    let url = build_search_url(&options.host, options.port, &request);
    if global.verbose {
        eprintln!("Requesting {}", url);
    }

    let client = reqwest::Client::new();
    let response = fetch_books(&client, &url).await?;

    if options.json {
        let json =
            serde_json::to_string_pretty(&response).context("JSON serialization failed")?;
        println!("{}", json);
        return Ok(());
    }

    let rendered = render(&response, &request)?;
    println!("{}", format_rendered(&rendered));

    Ok(())
}

/// Build the search API URL for a request
pub fn build_search_url(host: &str, port: u16, request: &SearchRequest) -> String {
    let query = request
        .to_params()
        .to_pairs()
        .into_iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("http://{host}:{port}/search?{query}")
}

/// Perform the search API call and decode its body
pub async fn fetch_books(client: &reqwest::Client, url: &str) -> Result<SearchResponse> {
    log::info!("GET {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::NetworkFailure(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::UnexpectedStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        }
        .into());
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::NetworkFailure(e.to_string()))?;

    decode_response(&body).map_err(|e| Error::InvalidResponse(e.to_string()).into())
}

fn paint(line: &Line) -> String {
    match line.kind {
        LineKind::NoResults => line.text.yellow().to_string(),
        LineKind::Header => line.text.bright_cyan().bold().to_string(),
        LineKind::Navigation => line.text.bright_yellow().to_string(),
        LineKind::Range => line.text.bright_white().to_string(),
        LineKind::EntryTitle => line.text.white().bold().to_string(),
        LineKind::EntryDetail => line.text.green().to_string(),
        LineKind::Blank => String::new(),
    }
}

/// Convert rendered results to colored terminal text
fn format_rendered(rendered: &Rendered) -> String {
    rendered
        .lines
        .iter()
        .map(paint)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookfinder_core::query::{Pagination, SortOrder, YearFilter, YearOp};

    #[test]
    fn test_build_search_url_title_only() {
        let request = SearchRequest::new("Dune");
        assert_eq!(
            build_search_url("api", 3000, &request),
            "http://api:3000/search?q=Dune"
        );
    }

    #[test]
    fn test_build_search_url_encodes_title() {
        let request = SearchRequest::new("The Lord & the Rings");
        assert_eq!(
            build_search_url("localhost", 8080, &request),
            "http://localhost:8080/search?q=The%20Lord%20%26%20the%20Rings"
        );
    }

    #[test]
    fn test_build_search_url_all_options() {
        let request = SearchRequest {
            title: "Dune".to_string(),
            year_filter: YearFilter::single(YearOp::After, 1960).unwrap(),
            sort_order: SortOrder::Descending,
            pagination: Pagination::Enabled {
                page: 2,
                page_size: 5,
            },
            limit: Some(40),
        };

        assert_eq!(
            build_search_url("book-api", 3000, &request),
            "http://book-api:3000/search?q=Dune&year_op=gt&year=1960&sort=desc&page=2&page_size=5&limit=40"
        );
    }

    #[test]
    fn test_build_search_url_range() {
        let request = parse_query(r#""Emma" year:1820-1810"#).unwrap();
        assert_eq!(
            build_search_url("api", 3000, &request),
            "http://api:3000/search?q=Emma&year_from=1810&year_to=1820"
        );
    }

    /// Serve `body` with `status` on a local port and return the search URL
    async fn stub_api(status: axum::http::StatusCode, body: &'static str) -> String {
        let app = axum::Router::new().route(
            "/search",
            axum::routing::get(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/search?q=Dune")
    }

    #[tokio::test]
    async fn test_fetch_books_success() {
        let url = stub_api(
            axum::http::StatusCode::OK,
            r#"{"total": 1, "books": [{"title": "Dune"}]}"#,
        )
        .await;

        let response = fetch_books(&reqwest::Client::new(), &url).await.unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(response.books[0].title.as_deref(), Some("Dune"));
    }

    #[tokio::test]
    async fn test_fetch_books_connection_refused() {
        let client = reqwest::Client::new();
        let err = fetch_books(&client, "http://127.0.0.1:9/search?q=Dune")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NetworkFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_books_error_status() {
        let url = stub_api(axum::http::StatusCode::SERVICE_UNAVAILABLE, "down").await;

        let err = fetch_books(&reqwest::Client::new(), &url)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_books_wrong_shape() {
        let url = stub_api(axum::http::StatusCode::OK, r#"{"error": "upstream down"}"#).await;

        let err = fetch_books(&reqwest::Client::new(), &url)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_format_rendered_keeps_text() {
        colored::control::set_override(false);

        let rendered = render(&SearchResponse::default(), &SearchRequest::new("Dune")).unwrap();
        assert_eq!(format_rendered(&rendered), "No books found matching \"Dune\".");
    }
}
