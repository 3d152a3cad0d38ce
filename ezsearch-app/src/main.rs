use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ezsearch_common::observability::{LogConfig, LogFormat, init_logging};
use ezsearch_config::{EzSearchConfig, EzSearchConfigLoader};
use ezsearch_mcp::SearchServer;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_FILE: &str = "ezsearch.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about = "DuckDuckGo web search as an MCP tool over stdio")]
struct Args {
    /// YAML configuration file; `ezsearch.yaml` is read when present.
    #[arg(long, env = "EZSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log encoding, overriding `logging.format`.
    #[arg(long, value_enum)]
    log_format: Option<CliLogFormat>,

    /// Also write logs to a daily rolling file.
    #[arg(long)]
    log_file: bool,

    /// Print the effective configuration as YAML and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliLogFormat {
    Text,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Text => LogFormat::Text,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

fn load_config(args: &Args) -> Result<EzSearchConfig> {
    let loader = match &args.config {
        Some(path) => EzSearchConfigLoader::new().with_file(path),
        None => EzSearchConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let config = loader.load().context("loading configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn log_config(args: &Args, config: &EzSearchConfig) -> LogConfig {
    let logging = &config.logging;
    LogConfig {
        app_name: "ezsearch",
        log_dir: logging.dir.clone(),
        emit_stderr: logging.stderr,
        emit_file: logging.file || args.log_file,
        format: args.log_format.map(LogFormat::from).unwrap_or(logging.format),
        default_filter: logging.filter.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let log_path = init_logging(log_config(&args, &config))?;
    tracing::info!(
        name = %config.server.name,
        version = %config.server.version,
        endpoint = %config.search.endpoint,
        log_file = ?log_path,
        "app.start"
    );

    let server = SearchServer::from_config(&config).context("building search server")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("app.ctrl_c");
                cancel.cancel();
            }
        }
    });

    let reason = server
        .serve_stdio(cancel.clone())
        .await
        .context("serving MCP over stdio")?;
    tracing::info!(?reason, "app.exit");

    if cancel.is_cancelled() {
        // The blocking stdin read never returns while the client holds the
        // pipe open; runtime shutdown would wait on it forever.
        std::process::exit(0);
    }
    Ok(())
}
