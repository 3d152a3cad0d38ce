//! Minimal HTTP client for scraping HTML pages with safe logging.
//!
//! - Request options: headers, query params, timeout, absolute URLs
//! - One attempt per request; callers decide what a failure means
//! - Timeouts are reported separately from other network failures
//! - Optional *raw* request/response logging via `EZSEARCH_HTTP_RAW=1`
//!
//! Example:
//! ```no_run
//! # async fn demo() -> Result<(), ezsearch_http::HttpError> {
//! use std::borrow::Cow;
//!
//! let client = ezsearch_http::HttpClient::new("https://html.duckduckgo.com")?;
//! let html = client
//!     .get_text(
//!         "html/",
//!         ezsearch_http::RequestOpts {
//!             query: Some(vec![("q", Cow::Borrowed("rust"))]),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! # let _ = html;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `EZSEARCH_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "EZSEARCH_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_sensitive_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization")
        || name.eq_ignore_ascii_case("cookie")
        || name.eq_ignore_ascii_case("set-cookie")
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let v = if is_sensitive_header(name.as_str()) {
            "<redacted>".to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_sensitive_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("server returned error {status}: {body_snippet}, request_id={request_id}")]
    Status {
        status: StatusCode,
        body_snippet: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status of the failed exchange, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Client & Request Options
// ==============================

/// Settings fixed at client construction time.
///
/// ```
/// use ezsearch_http::ClientOptions;
/// use std::time::Duration;
///
/// let opts = ClientOptions::default();
/// assert_eq!(opts.connect_timeout, Duration::from_secs(5));
/// assert!(opts.user_agent.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    /// Sent as `User-Agent` on every request unless a request overrides it.
    pub user_agent: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            user_agent: None,
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use ezsearch_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("q", Cow::Borrowed("rust"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.allow_absolute == false);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("q", "term".into())]
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    user_agent: Option<String>,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use ezsearch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://html.duckduckgo.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_options(base, ClientOptions::default())
    }

    /// Construct a client with explicit connect timeout and user agent.
    pub fn with_options(base: &str, options: ClientOptions) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let mut builder = Client::builder().connect_timeout(options.connect_timeout);
        if let Some(ua) = &options.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            user_agent: options.user_agent,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use ezsearch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://html.duckduckgo.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base (or take it verbatim when allowed).
    pub fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET a document and return its body as text.
    ///
    /// Any status outside 2xx is an [`HttpError::Status`]; the body is only
    /// returned for successful responses.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;
        let method = Method::GET;

        // ----- Build request -----
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        rb = rb.timeout(timeout);

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let request = rb.build().map_err(|e| HttpError::Build(e.to_string()))?;

        // ----- Safe request logging (pre-send) -----
        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());
        let query_keys: Vec<&str> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, _)| *k).collect())
            .unwrap_or_default();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", request.url().host_str().unwrap_or("-"), request.url().path()),
            query_keys=?query_keys,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        if raw_enabled() {
            let mut merged = request.headers().clone();
            if let Some(ua) = &self.user_agent {
                if !merged.contains_key(USER_AGENT) {
                    if let Ok(v) = ua.parse() {
                        merged.insert(USER_AGENT, v);
                    }
                }
            }
            let curl = make_curl(&method, request.url(), &merged);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = match self.inner.execute(request).await {
            Ok(resp) => resp,
            Err(err) => {
                let error = if err.is_timeout() {
                    HttpError::Timeout(timeout)
                } else {
                    HttpError::Network(err.to_string())
                };
                tracing::warn!(
                    req_id=%req_id,
                    error=%error,
                    elapsed_ms=t0.elapsed().as_millis() as u64,
                    "http.network_error.send"
                );
                return Err(error);
            }
        };
        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                let error = if err.is_timeout() {
                    HttpError::Timeout(timeout)
                } else {
                    HttpError::Body(err.to_string())
                };
                tracing::warn!(req_id=%req_id, error=%error, "http.network_error.body");
                return Err(error);
            }
        };
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            redirected=%(final_url != url),
            x_request_id=%req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snippet,
            "http.response.body_snippet"
        );

        if status.is_success() {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        let request_id = req_hdr_id.to_string();
        tracing::warn!(
            req_id=%req_id,
            %status,
            x_request_id=%request_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Status {
            status,
            body_snippet: snippet,
            request_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
