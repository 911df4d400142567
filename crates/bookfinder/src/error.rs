#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Search API at {url} answered with HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Could not decode the search response: {0}")]
    InvalidResponse(String),
}
