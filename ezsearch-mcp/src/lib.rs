//! Model Context Protocol host exposing web search as a tool, built on `rmcp`.
//!
//! - The `search` tool, its arguments and text rendering (`server`)
//! - Serving over stdin/stdout or any byte stream pair (`stdio`)
//!
//! ```no_run
//! use ezsearch_config::EzSearchConfig;
//! use ezsearch_mcp::SearchServer;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let cfg = EzSearchConfig::default();
//! let server = SearchServer::from_config(&cfg)?;
//! server.serve_stdio(CancellationToken::new()).await?;
//! # Ok(()) }
//! ```

pub mod server;
pub mod stdio;

pub use rmcp::service::QuitReason;
pub use server::{NO_RESULTS, SearchArgs, SearchServer, render_results};
