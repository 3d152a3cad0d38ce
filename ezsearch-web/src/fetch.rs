use async_trait::async_trait;
use ezsearch_http::HttpError;
use thiserror::Error;

/// The results page could not be retrieved.
#[derive(Debug, Error)]
#[error("fetching {url} failed: {source}")]
pub struct FetchError {
    /// Request URL (query included) for diagnostics.
    pub url: String,
    #[source]
    pub source: HttpError,
}

/// Retrieves the raw HTML results page for a query.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String, FetchError>;
}
