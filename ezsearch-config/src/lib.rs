//! Loader for ezsearch configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, YAML sources in the order
//! they were added, then `EZSEARCH__`-prefixed environment variables (`__`
//! separates nesting levels, e.g. `EZSEARCH__SEARCH__TIMEOUT_SECS=5`).
//! `${VAR}` placeholders inside string values are expanded after merging.
//!
//! Everything that depends on DuckDuckGo's page structure (selectors, redirect
//! wrapper shape, origin) lives in [`SearchSettings`], so markup drift is a
//! configuration change rather than a code change.
use config::{Config, ConfigError, Environment, File};
use ezsearch_common::observability::LogFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
pub const DEFAULT_ORIGIN: &str = "https://duckduckgo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EzSearchConfig {
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub logging: LoggingSettings,
}

/// Identity reported to MCP clients during `initialize`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
    pub version: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "ez-web-search-mcp".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// HTML results endpoint; the query is sent as its `q` parameter.
    pub endpoint: String,
    /// Origin that relative result links are resolved against.
    pub origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Result count used when a tool call omits `limit`.
    pub default_limit: usize,
    /// Path prefix of the engine's click-through redirect (`/l/?uddg=...`).
    pub redirect_prefix: String,
    /// Query parameter of the redirect carrying the destination URL.
    pub redirect_param: String,
    pub selectors: SelectorSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            origin: DEFAULT_ORIGIN.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 15,
            connect_timeout_secs: 5,
            default_limit: DEFAULT_LIMIT,
            redirect_prefix: "/l/".into(),
            redirect_param: "uddg".into(),
            selectors: SelectorSettings::default(),
        }
    }
}

/// CSS selectors locating results in the HTML page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorSettings {
    /// One match per organic result.
    pub container: String,
    /// Anchor inside a container; text is the title, `href` the link.
    pub title: String,
    /// Snippet inside a container; text is the description.
    pub snippet: String,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            container: ".result".into(),
            title: ".result__title a".into(),
            snippet: ".result__snippet".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// Default `EnvFilter` directive; `RUST_LOG` still wins.
    pub filter: String,
    pub stderr: bool,
    pub file: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            stderr: true,
            file: false,
            dir: None,
        }
    }
}

impl EzSearchConfig {
    /// Reject values that would only fail later, at first use.
    ///
    /// ```
    /// use ezsearch_config::EzSearchConfig;
    ///
    /// let mut cfg = EzSearchConfig::default();
    /// assert!(cfg.validate().is_ok());
    ///
    /// cfg.search.default_limit = 0;
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;
        if search.timeout_secs == 0 {
            return Err(invalid("search.timeout_secs must be at least 1"));
        }
        if search.connect_timeout_secs == 0 {
            return Err(invalid("search.connect_timeout_secs must be at least 1"));
        }
        if search.default_limit == 0 {
            return Err(invalid("search.default_limit must be at least 1"));
        }
        for (key, value) in [("search.endpoint", &search.endpoint), ("search.origin", &search.origin)] {
            Url::parse(value).map_err(|e| invalid(&format!("{key} is not a valid URL: {e}")))?;
        }
        if search.redirect_param.trim().is_empty() {
            return Err(invalid("search.redirect_param must not be empty"));
        }
        Ok(())
    }

    /// Effective configuration rendered as YAML, in the same shape the loader reads.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Message(message.to_string())
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct EzSearchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for EzSearchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl EzSearchConfigLoader {
    /// Start from defaults with `EZSEARCH__` env overrides.
    ///
    /// ```
    /// use ezsearch_config::EzSearchConfigLoader;
    ///
    /// let config = EzSearchConfigLoader::new()
    ///     .with_yaml_str("search:\n  default_limit: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.default_limit, 3);
    /// assert_eq!(config.search.selectors.container, ".result");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Environment variables are layered last, then `${VAR}` placeholders are
    /// expanded before the typed structs are materialised.
    ///
    /// ```
    /// use ezsearch_config::EzSearchConfigLoader;
    ///
    /// unsafe { std::env::set_var("EZ_DOC_AGENT", "doc-agent/1.0"); }
    ///
    /// let config = EzSearchConfigLoader::new()
    ///     .with_yaml_str("search:\n  user_agent: \"${EZ_DOC_AGENT}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.search.user_agent, "doc-agent/1.0");
    ///
    /// unsafe { std::env::remove_var("EZ_DOC_AGENT"); }
    /// ```
    pub fn load(self) -> Result<EzSearchConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("EZSEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: EzSearchConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_match_duckduckgo_html_page() {
        let cfg = EzSearchConfig::default();
        assert_eq!(cfg.search.endpoint, "https://html.duckduckgo.com/html/");
        assert_eq!(cfg.search.origin, "https://duckduckgo.com");
        assert_eq!(cfg.search.redirect_prefix, "/l/");
        assert_eq!(cfg.search.redirect_param, "uddg");
        assert_eq!(cfg.search.default_limit, 10);
        assert_eq!(cfg.search.selectors.title, ".result__title a");
        assert!(cfg.search.user_agent.starts_with("Mozilla/5.0"));
        assert!(cfg.logging.stderr);
        assert!(!cfg.logging.file);
    }

    #[test]
    fn yaml_dump_loads_back_unchanged() {
        let mut cfg = EzSearchConfig::default();
        cfg.search.default_limit = 4;
        cfg.logging.format = LogFormat::Json;
        let yaml = cfg.to_yaml().unwrap();
        assert!(yaml.contains("default_limit: 4"));

        let loaded = EzSearchConfigLoader::new().with_yaml_str(&yaml).load().unwrap();
        assert_eq!(loaded.search.default_limit, 4);
        assert_eq!(loaded.logging.format, LogFormat::Json);
        assert_eq!(loaded.search.selectors.snippet, ".result__snippet");
    }

    #[test]
    fn validate_rejects_bad_urls_and_zero_timeouts() {
        let mut cfg = EzSearchConfig::default();
        cfg.search.origin = "duckduckgo.com".into();
        assert!(cfg.validate().is_err());

        let mut cfg = EzSearchConfig::default();
        cfg.search.timeout_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EzSearchConfig::default();
        cfg.search.redirect_param = " ".into();
        assert!(cfg.validate().is_err());
    }
}
