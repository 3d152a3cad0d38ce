//! Web search over DuckDuckGo's HTML results page.
//!
//! - Data model and validation (`types`)
//! - Fetching the results page (`fetch`, `duckduckgo`)
//! - Scraping results out of the page (`extract`)
//! - Orchestration of one search call (`engine`)
//!
//! ```no_run
//! use ezsearch_config::SearchSettings;
//! use ezsearch_web::{SearchEngine, SearchQuery};
//!
//! # async fn demo() -> Result<(), ezsearch_web::SearchError> {
//! let engine = SearchEngine::from_settings(&SearchSettings::default())?;
//! let page = engine.search(&SearchQuery::new("rust async", 5)?).await?;
//! for hit in page.iter() {
//!     println!("{} -> {}", hit.title, hit.url);
//! }
//! # Ok(()) }
//! ```

pub mod duckduckgo;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod types;

pub use duckduckgo::DuckDuckGoFetcher;
pub use engine::SearchEngine;
pub use extract::{Extractor, ResultSelectors, UrlPolicy};
pub use fetch::{FetchError, Fetcher};
pub use types::{ResultPage, SearchError, SearchQuery, SearchResult};
