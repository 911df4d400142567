use crate::prelude::{eprintln, *};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bookfinder_core::books::{BookSummary, OpenLibraryResponse, SearchResponse};
use bookfinder_core::catalog::build_response;
use bookfinder_core::query::{QueryError, SearchParams, SearchRequest};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Args, Clone)]
pub struct ServeOptions {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "API_PORT", default_value = "3000")]
    pub port: u16,

    /// Open Library base URL
    #[arg(long, env = "OPENLIBRARY_URL", default_value = "http://openlibrary.org")]
    pub upstream: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    client: reqwest::Client,
    upstream: String,
}

impl AppState {
    pub fn new(upstream: impl Into<String>) -> Self {
        AppState {
            client: reqwest::Client::new(),
            upstream: upstream.into(),
        }
    }
}

/// Error returned to API callers as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::MissingTitle => {
                ApiError::BadRequest("Missing query parameter `q`".to_string())
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let addr = format!("{}:{}", options.bind, options.port);

    if global.verbose {
        eprintln!("Proxying searches to {}", options.upstream);
    }

    let app_router = router(Arc::new(AppState::new(options.upstream)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server running on http://{addr}");
    if global.verbose {
        eprintln!("Search endpoint: http://{}/search?q=<title>", addr);
    }

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(search_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = SearchRequest::try_from(params)?;
    log::info!("Search {request:?}");

    let docs = fetch_open_library(&state, &request.title).await?;
    let response = build_response(docs, &request);
    log::debug!(
        "Returning {} of {} matching books",
        response.books.len(),
        response.total
    );

    Ok(Json(response))
}

/// Build the Open Library search URL for a title
pub fn open_library_url(upstream: &str, title: &str) -> String {
    format!(
        "{}/search.json?q={}",
        upstream.trim_end_matches('/'),
        urlencoding::encode(title)
    )
}

async fn fetch_open_library(
    state: &AppState,
    title: &str,
) -> std::result::Result<Vec<BookSummary>, Error> {
    let url = open_library_url(&state.upstream, title);
    log::info!("Searching: {url}");

    let response = state
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::NetworkFailure(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::UnexpectedStatus {
            url,
            status: response.status().as_u16(),
        });
    }

    let body: OpenLibraryResponse = response
        .json()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))?;

    Ok(body.docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_library_url() {
        assert_eq!(
            open_library_url("http://openlibrary.org/", "The Hobbit"),
            "http://openlibrary.org/search.json?q=The%20Hobbit"
        );
    }

    #[test]
    fn test_missing_title_is_bad_request() {
        let response = ApiError::from(QueryError::MissingTitle).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let error = Error::NetworkFailure("connection refused".to_string());
        let response = ApiError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_search_handler_rejects_invalid_params() {
        let state = Arc::new(AppState::new("http://127.0.0.1:9"));

        let missing = search_handler(State(state.clone()), Query(SearchParams::default())).await;
        assert!(matches!(missing, Err(ApiError::BadRequest(_))));

        let params = SearchParams {
            q: Some("Dune".to_string()),
            page: Some(0),
            ..SearchParams::default()
        };
        let bad_page = search_handler(State(state), Query(params)).await;
        match bad_page {
            Err(ApiError::BadRequest(message)) => assert!(message.contains("Invalid page 0")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(body) = health_handler().await;
        assert_eq!(body["status"], "ok");
    }
}
