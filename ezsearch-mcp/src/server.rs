//! `SearchServer`: the `search` tool behind rmcp's tool router.

use std::sync::Arc;

use ezsearch_config::{EzSearchConfig, ServerSettings};
use ezsearch_web::{ResultPage, SearchEngine, SearchError, SearchQuery};
use rmcp::handler::server::tool::{ToolCallContext, ToolRouter};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::handler::server::ServerHandler;
use rmcp::model::*;
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

pub const NO_RESULTS: &str = "No results found.";

/// Arguments of the `search` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Search terms
    pub query: String,
    /// Kept loose so `3.0` is accepted and `2.5` gets a precise error.
    #[serde(default)]
    #[schemars(schema_with = "limit_schema")]
    pub limit: Option<Value>,
}

fn limit_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    let mut map = serde_json::Map::new();
    map.insert("type".to_owned(), json!(["integer", "null"]));
    map.insert("minimum".to_owned(), json!(1));
    map.insert(
        "description".to_owned(),
        json!("Maximum number of results to return (default 10)"),
    );
    map.into()
}

#[derive(Clone)]
pub struct SearchServer {
    engine: Arc<SearchEngine>,
    default_limit: usize,
    identity: ServerSettings,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SearchServer {
    pub fn new(engine: Arc<SearchEngine>, default_limit: usize, identity: ServerSettings) -> Self {
        Self {
            engine,
            default_limit,
            identity,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Performs a web search using DuckDuckGo and returns a list of results.")]
    async fn search(&self, params: Parameters<SearchArgs>) -> Result<CallToolResult, McpError> {
        let query = self.query_from(params.0)?;
        match self.engine.search(&query).await {
            Ok(page) => Ok(CallToolResult::success(vec![Content::text(render_results(&page))])),
            Err(SearchError::InvalidInput(msg)) => Err(McpError::invalid_params(msg, None)),
            Err(err) => {
                tracing::warn!(target: "mcp.search", error = %err, "search.tool.failed");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Search failed: {err}"
                ))]))
            }
        }
    }
}

impl SearchServer {
    /// Engine built from `config.search`, identity from `config.server`.
    pub fn from_config(config: &EzSearchConfig) -> Result<Self, SearchError> {
        let engine = SearchEngine::from_settings(&config.search)?;
        Ok(Self::new(
            Arc::new(engine),
            config.search.default_limit,
            config.server.clone(),
        ))
    }

    fn query_from(&self, args: SearchArgs) -> Result<SearchQuery, McpError> {
        let limit = match args.limit {
            None | Some(Value::Null) => self.default_limit,
            Some(value) => positive_integer(&value).ok_or_else(|| {
                McpError::invalid_params("limit must be a positive integer", None)
            })?,
        };
        SearchQuery::new(args.query, limit).map_err(|err| McpError::invalid_params(err.to_string(), None))
    }
}

impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.identity.name.clone(),
                version: self.identity.version.clone(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Call `search` with a query to get DuckDuckGo web results as plain text.".to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(target: "mcp.server", tool = %request.name, "mcp.tools_call");
        let tcc = ToolCallContext::new(self, request, context);
        self.tool_router.call(tcc).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
        })
    }
}

/// Accepts `3` and `3.0`; rejects zero, negatives, fractions and non-numbers.
fn positive_integer(value: &Value) -> Option<usize> {
    let n = value.as_number()?;
    let whole = match n.as_u64() {
        Some(n) => n,
        None => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 || f < 1.0 || f > u64::MAX as f64 {
                return None;
            }
            f as u64
        }
    };
    usize::try_from(whole).ok().filter(|n| *n >= 1)
}

/// Four lines per result, `---` terminated, entries joined by newlines.
///
/// ```
/// use ezsearch_mcp::server::render_results;
/// use ezsearch_web::{ResultPage, SearchResult};
///
/// let page: ResultPage = vec![SearchResult {
///     title: "Rust".into(),
///     url: "https://www.rust-lang.org/".into(),
///     description: None,
/// }]
/// .into_iter()
/// .collect();
///
/// assert_eq!(
///     render_results(&page),
///     "Title: Rust\nURL: https://www.rust-lang.org/\nDescription: N/A\n---"
/// );
/// assert_eq!(render_results(&ResultPage::default()), "No results found.");
/// ```
pub fn render_results(page: &ResultPage) -> String {
    if page.is_empty() {
        return NO_RESULTS.to_string();
    }
    page.iter()
        .map(|hit| {
            format!(
                "Title: {}\nURL: {}\nDescription: {}\n---",
                hit.title,
                hit.url,
                hit.description.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ezsearch_web::SearchResult;

    fn server() -> SearchServer {
        SearchServer::from_config(&EzSearchConfig::default()).unwrap()
    }

    fn args(value: Value) -> SearchArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn limit_defaults_and_validation() {
        let s = server();
        assert_eq!(s.query_from(args(json!({"query": "x"}))).unwrap().limit(), 10);
        assert_eq!(s.query_from(args(json!({"query": "x", "limit": null}))).unwrap().limit(), 10);
        assert_eq!(s.query_from(args(json!({"query": "x", "limit": 3}))).unwrap().limit(), 3);
        assert_eq!(s.query_from(args(json!({"query": "x", "limit": 2.0}))).unwrap().limit(), 2);

        for bad in [json!(0), json!(-1), json!(2.5), json!("5"), json!(true)] {
            let err = s
                .query_from(args(json!({"query": "x", "limit": bad})))
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS, "{bad}");
            assert!(err.message.contains("limit"), "{bad} gave {}", err.message);
        }
    }

    #[test]
    fn blank_queries_are_invalid_params() {
        let s = server();
        for query in ["", "  ", "\n\t"] {
            let err = s.query_from(args(json!({"query": query}))).unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        }
        assert_eq!(s.query_from(args(json!({"query": "  rust "}))).unwrap().text(), "rust");
    }

    #[test]
    fn ill_typed_arguments_do_not_deserialize() {
        for bad in [json!({}), json!({"query": 5}), json!("rust")] {
            assert!(serde_json::from_value::<SearchArgs>(bad).is_err());
        }
    }

    #[test]
    fn render_separates_entries_with_newlines() {
        let page: ResultPage = vec![
            SearchResult {
                title: "A".into(),
                url: "https://a.example".into(),
                description: Some("first".into()),
            },
            SearchResult {
                title: "B".into(),
                url: "https://b.example".into(),
                description: None,
            },
        ]
        .into_iter()
        .collect();
        assert_eq!(
            render_results(&page),
            "Title: A\nURL: https://a.example\nDescription: first\n---\nTitle: B\nURL: https://b.example\nDescription: N/A\n---"
        );
    }

    #[test]
    fn router_advertises_the_search_tool() {
        let tools = server().tool_router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search");
        assert_eq!(tools[0].input_schema["required"], json!(["query"]));
        assert_eq!(tools[0].input_schema["properties"]["limit"]["minimum"], 1);
    }

    #[test]
    fn info_reports_configured_identity() {
        let mut config = EzSearchConfig::default();
        config.server.name = "custom-search".into();
        let info = SearchServer::from_config(&config).unwrap().get_info();
        assert_eq!(info.server_info.name, "custom-search");
        assert!(info.capabilities.tools.is_some());
    }
}
