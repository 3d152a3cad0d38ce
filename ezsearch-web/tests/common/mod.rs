#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::OnceLock;

use ezsearch_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "ezsearch-tests",
            emit_stderr: true,
            format: if std::env::var("EZSEARCH_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        ezsearch_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}
