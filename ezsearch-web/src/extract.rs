//! Scraping search results out of DuckDuckGo's HTML results page.
//!
//! The page is third-party markup that changes without notice, so nothing in
//! here fails on unexpected structure: a container without a usable anchor is
//! skipped and a page without containers yields an empty [`ResultPage`].
//!
//! Containers are pulled lazily and iteration stops as soon as `limit`
//! results exist; later containers are never inspected.

use ezsearch_config::{SearchSettings, SelectorSettings};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{ResultPage, SearchError, SearchResult};

/// Compiled CSS selectors for result containers and their parts.
#[derive(Debug, Clone)]
pub struct ResultSelectors {
    container: Selector,
    title: Selector,
    snippet: Selector,
}

impl ResultSelectors {
    pub fn parse(container: &str, title: &str, snippet: &str) -> Result<Self, SearchError> {
        Ok(Self {
            container: compile("container", container)?,
            title: compile("title", title)?,
            snippet: compile("snippet", snippet)?,
        })
    }

    pub fn from_settings(settings: &SelectorSettings) -> Result<Self, SearchError> {
        Self::parse(&settings.container, &settings.title, &settings.snippet)
    }
}

fn compile(which: &str, css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css)
        .map_err(|e| SearchError::Setup(format!("invalid {which} selector {css:?}: {e}")))
}

/// Turns an anchor `href` into the destination URL a user would land on.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    origin: Url,
    redirect_prefix: String,
    redirect_param: String,
}

impl UrlPolicy {
    pub fn new(
        origin: &str,
        redirect_prefix: impl Into<String>,
        redirect_param: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let origin = Url::parse(origin)
            .map_err(|e| SearchError::Setup(format!("invalid origin {origin:?}: {e}")))?;
        Ok(Self {
            origin,
            redirect_prefix: redirect_prefix.into(),
            redirect_param: redirect_param.into(),
        })
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, SearchError> {
        Self::new(
            &settings.origin,
            settings.redirect_prefix.clone(),
            settings.redirect_param.clone(),
        )
    }

    /// Normalize a result link.
    ///
    /// 1. Redirect wrappers on the engine's host (`/l/?uddg=<encoded>`) are
    ///    replaced by their decoded destination.
    /// 2. Links without a scheme are resolved against the origin; this covers
    ///    protocol-relative `//host/path` links, which take the origin's scheme.
    /// 3. Absolute links are returned verbatim.
    ///
    /// Returns `None` for empty or unparsable links.
    ///
    /// ```
    /// use ezsearch_web::UrlPolicy;
    ///
    /// let policy = UrlPolicy::new("https://duckduckgo.com", "/l/", "uddg").unwrap();
    /// assert_eq!(
    ///     policy.normalize("/l/?uddg=https%3A%2F%2Fexample.com").as_deref(),
    ///     Some("https://example.com")
    /// );
    /// assert_eq!(
    ///     policy.normalize("/about").as_deref(),
    ///     Some("https://duckduckgo.com/about")
    /// );
    /// assert_eq!(
    ///     policy.normalize("https://www.rust-lang.org").as_deref(),
    ///     Some("https://www.rust-lang.org")
    /// );
    /// ```
    pub fn normalize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let (resolved, absolute) = match Url::parse(href) {
            Ok(url) => (url, true),
            Err(url::ParseError::RelativeUrlWithoutBase) => (self.origin.join(href).ok()?, false),
            Err(_) => return None,
        };

        if self.is_redirect_wrapper(&resolved) {
            if let Some(target) = self.redirect_target(&resolved) {
                return Some(target);
            }
        }

        if absolute {
            Some(href.to_string())
        } else {
            Some(resolved.into())
        }
    }

    fn is_redirect_wrapper(&self, url: &Url) -> bool {
        let on_engine = match (url.host_str(), self.origin.host_str()) {
            (Some(host), Some(origin)) => {
                host == origin || host.ends_with(&format!(".{origin}"))
            }
            _ => false,
        };
        on_engine && url.path().starts_with(&self.redirect_prefix)
    }

    fn redirect_target(&self, url: &Url) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == self.redirect_param.as_str())
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.trim().is_empty())
    }
}

/// Parsed results page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parsing never fails; broken markup is repaired the way browsers do it.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Matching nodes in document order, produced lazily.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ResultBlock<'a>> {
        self.html.select(selector).map(ResultBlock::new)
    }
}

/// A node of an [`HtmlDocument`].
#[derive(Debug, Clone, Copy)]
pub struct ResultBlock<'a> {
    element: ElementRef<'a>,
}

impl<'a> ResultBlock<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// First descendant matching `selector`.
    pub fn first(&self, selector: &Selector) -> Option<ResultBlock<'a>> {
        self.element.select(selector).next().map(ResultBlock::new)
    }

    /// Visible text with surrounding whitespace removed.
    pub fn text(&self) -> String {
        self.element.text().collect::<String>().trim().to_string()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }
}

/// Scrapes [`SearchResult`]s from a results page.
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: ResultSelectors,
    urls: UrlPolicy,
}

impl Extractor {
    pub fn new(selectors: ResultSelectors, urls: UrlPolicy) -> Self {
        Self { selectors, urls }
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, SearchError> {
        Ok(Self::new(
            ResultSelectors::from_settings(&settings.selectors)?,
            UrlPolicy::from_settings(settings)?,
        ))
    }

    pub fn url_policy(&self) -> &UrlPolicy {
        &self.urls
    }

    /// Up to `limit` results in document order.
    pub fn extract(&self, html: &str, limit: usize) -> ResultPage {
        self.extract_counted(html, limit).0
    }

    /// Page plus the number of containers read to fill it.
    fn extract_counted(&self, html: &str, limit: usize) -> (ResultPage, usize) {
        let document = HtmlDocument::parse(html);
        let mut inspected = 0usize;
        let candidates = document.select(&self.selectors.container).map(|block| {
            inspected += 1;
            self.read_block(block)
        });
        let page = take_results(candidates, limit);

        tracing::debug!(
            target: "web.extract",
            limit,
            inspected,
            emitted = page.len(),
            skipped = inspected - page.len(),
            "extract.done"
        );
        (page, inspected)
    }

    fn read_block(&self, block: ResultBlock<'_>) -> Option<SearchResult> {
        let anchor = block.first(&self.selectors.title)?;
        let title = anchor.text();
        if title.is_empty() {
            return None;
        }
        let url = self.urls.normalize(anchor.attr("href")?)?;
        let description = block
            .first(&self.selectors.snippet)
            .map(|snippet| snippet.text())
            .filter(|text| !text.is_empty());

        Some(SearchResult {
            title,
            url,
            description,
        })
    }
}

/// Collect usable candidates until `limit` results exist.
///
/// `None` marks a container that yielded nothing usable. Nothing past the
/// candidate that completes the page is pulled from the iterator.
pub fn take_results<I>(candidates: I, limit: usize) -> ResultPage
where
    I: IntoIterator<Item = Option<SearchResult>>,
{
    candidates.into_iter().flatten().take(limit).collect()
}
