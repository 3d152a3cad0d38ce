use std::path::PathBuf;
use std::sync::OnceLock;

use ezsearch_common::observability::LogConfig;

static INIT_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "ezsearch-tests",
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };
        ezsearch_common::observability::init_logging(config).unwrap_or_default()
    });
}
