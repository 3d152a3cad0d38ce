use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller input was rejected before any request was made.
    #[error("invalid search input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration could not be turned into a working engine.
    #[error("search engine setup failed: {0}")]
    Setup(String),
}

/// A validated search request.
///
/// ```
/// use ezsearch_web::SearchQuery;
///
/// let q = SearchQuery::new("  rust  ", 3).unwrap();
/// assert_eq!(q.text(), "rust");
/// assert_eq!(q.limit(), 3);
///
/// assert!(SearchQuery::new("   ", 3).is_err());
/// assert!(SearchQuery::new("rust", 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Result<Self, SearchError> {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::InvalidInput("query cannot be empty".into()));
        }
        if limit == 0 {
            return Err(SearchError::InvalidInput(
                "limit must be a positive integer".into(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
            limit,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// One organic hit scraped from the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Results in page order, never longer than the requested limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultPage(Vec<SearchResult>);

impl ResultPage {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<SearchResult> {
        self.0
    }
}

impl FromIterator<SearchResult> for ResultPage {
    fn from_iter<I: IntoIterator<Item = SearchResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResultPage {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultPage {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_serializes_as_plain_array() {
        let page: ResultPage = vec![
            SearchResult {
                title: "Rust".into(),
                url: "https://www.rust-lang.org/".into(),
                description: Some("A language".into()),
            },
            SearchResult {
                title: "Docs".into(),
                url: "https://doc.rust-lang.org/".into(),
                description: None,
            },
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"title": "Rust", "url": "https://www.rust-lang.org/", "description": "A language"},
                {"title": "Docs", "url": "https://doc.rust-lang.org/"}
            ])
        );
    }

    #[test]
    fn query_validation_messages_name_the_field() {
        let err = SearchQuery::new("", 1).unwrap_err();
        assert!(err.to_string().contains("query"));
        let err = SearchQuery::new("x", 0).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }
}
