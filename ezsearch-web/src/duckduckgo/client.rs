use async_trait::async_trait;
use ezsearch_config::SearchSettings;
use ezsearch_http::{ClientOptions, HttpClient, RequestOpts};
use std::borrow::Cow;
use std::time::Duration;
use url::Url;

use crate::fetch::{FetchError, Fetcher};
use crate::types::SearchError;

/// Longest query prefix written to logs.
const LOGGED_QUERY_CHARS: usize = 160;

/// Fetches the HTML results page with a browser-like `User-Agent`.
///
/// One GET per query, no retries. A non-2xx status, a timeout or a transport
/// failure all surface as [`FetchError`].
#[derive(Clone)]
pub struct DuckDuckGoFetcher {
    http: HttpClient,
    endpoint: Url,
}

impl DuckDuckGoFetcher {
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SearchError::Setup(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let http = HttpClient::with_options(
            endpoint.as_str(),
            ClientOptions {
                connect_timeout,
                user_agent: Some(user_agent.to_string()),
            },
        )
        .map_err(|e| SearchError::Setup(e.to_string()))?
        .with_timeout(timeout);
        Ok(Self { http, endpoint })
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, SearchError> {
        Self::new(
            &settings.endpoint,
            &settings.user_agent,
            Duration::from_secs(settings.connect_timeout_secs),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Full request URL for `query`, percent-encoded as the `q` parameter.
    ///
    /// ```
    /// use ezsearch_web::DuckDuckGoFetcher;
    /// use std::time::Duration;
    ///
    /// let f = DuckDuckGoFetcher::new(
    ///     "https://html.duckduckgo.com/html/",
    ///     "agent/1.0",
    ///     Duration::from_secs(1),
    ///     Duration::from_secs(1),
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     f.search_url("rust & go").as_str(),
    ///     "https://html.duckduckgo.com/html/?q=rust+%26+go"
    /// );
    /// ```
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }
}

#[async_trait]
impl Fetcher for DuckDuckGoFetcher {
    async fn fetch(&self, query: &str) -> Result<String, FetchError> {
        let logged: String = query.chars().take(LOGGED_QUERY_CHARS).collect();
        tracing::debug!(target: "web.duckduckgo", query = %logged, "duckduckgo.fetch.start");

        let opts = RequestOpts {
            query: Some(vec![("q", Cow::Borrowed(query))]),
            allow_absolute: true,
            ..Default::default()
        };
        match self.http.get_text(self.endpoint.as_str(), opts).await {
            Ok(html) => {
                tracing::debug!(
                    target: "web.duckduckgo",
                    query = %logged,
                    body_len = html.len(),
                    "duckduckgo.fetch.ok"
                );
                Ok(html)
            }
            Err(source) => Err(FetchError {
                url: self.search_url(query).into(),
                source,
            }),
        }
    }
}
