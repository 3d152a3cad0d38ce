use ezsearch_config::SearchSettings;
use std::time::Instant;

use crate::duckduckgo::DuckDuckGoFetcher;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::types::{ResultPage, SearchError, SearchQuery};

/// One search call: fetch the results page, then scrape it.
///
/// Stateless between calls, so a single engine can serve concurrent searches.
pub struct SearchEngine<F = DuckDuckGoFetcher> {
    fetcher: F,
    extractor: Extractor,
}

impl SearchEngine<DuckDuckGoFetcher> {
    pub fn from_settings(settings: &SearchSettings) -> Result<Self, SearchError> {
        Ok(Self::new(
            DuckDuckGoFetcher::from_settings(settings)?,
            Extractor::from_settings(settings)?,
        ))
    }
}

impl<F: Fetcher> SearchEngine<F> {
    pub fn new(fetcher: F, extractor: Extractor) -> Self {
        Self { fetcher, extractor }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Results for `query`, at most `query.limit()` of them.
    ///
    /// An empty page is a success; only a failed fetch is an error.
    pub async fn search(&self, query: &SearchQuery) -> Result<ResultPage, SearchError> {
        let t0 = Instant::now();
        let html = match self.fetcher.fetch(query.text()).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(
                    target: "web.search",
                    error = %err,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "search.fetch.error"
                );
                return Err(err.into());
            }
        };

        let page = self.extractor.extract(&html, query.limit());
        tracing::info!(
            target: "web.search",
            limit = query.limit(),
            results = page.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "search.done"
        );
        Ok(page)
    }
}
