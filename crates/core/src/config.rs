use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub sourcing: SourcingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub openai_api_key: Option<SecretString>,
    pub google_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub google_model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Whether a usable OpenAI credential is configured. Blank keys count as
    /// absent.
    pub fn has_openai(&self) -> bool {
        filled(&self.openai_api_key)
    }

    /// Whether a usable Google credential is configured.
    pub fn has_google(&self) -> bool {
        filled(&self.google_api_key)
    }
}

fn filled(key: &Option<SecretString>) -> bool {
    key.as_ref().map(|value| !value.expose_secret().trim().is_empty()).unwrap_or(false)
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub tavily_api_key: Option<SecretString>,
    pub serper_api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub url: String,
    pub ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SourcingConfig {
    pub max_suppliers: u32,
    pub reports_dir: PathBuf,
    pub dashboard_command: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub max_suppliers: Option<u32>,
    pub reports_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                openai_api_key: None,
                google_api_key: None,
                openai_base_url: "https://api.openai.com".to_string(),
                openai_model: "gpt-4".to_string(),
                google_model: "gemini-pro".to_string(),
                timeout_secs: 120,
            },
            search: SearchConfig {
                tavily_api_key: None,
                serper_api_key: None,
                timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: "sqlite://data/sourcing.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            cache: CacheConfig {
                enabled: true,
                url: "redis://localhost:6379".to_string(),
                ttl_secs: 3600,
            },
            sourcing: SourcingConfig {
                max_suppliers: 50,
                reports_dir: PathBuf::from("data/reports"),
                dashboard_command: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("sourcing.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Whether an OpenAI credential is configured.
    pub fn has_openai(&self) -> bool {
        self.llm.has_openai()
    }

    /// Whether a Google credential is configured.
    pub fn has_google(&self) -> bool {
        self.llm.has_google()
    }

    /// Whether any web search credential is configured. Missing search keys
    /// are non-fatal; callers degrade to empty search results.
    pub fn has_search(&self) -> bool {
        filled(&self.search.tavily_api_key) || filled(&self.search.serper_api_key)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(openai_api_key_value) = llm.openai_api_key {
                self.llm.openai_api_key = Some(secret_value(openai_api_key_value));
            }
            if let Some(google_api_key_value) = llm.google_api_key {
                self.llm.google_api_key = Some(secret_value(google_api_key_value));
            }
            if let Some(openai_base_url) = llm.openai_base_url {
                self.llm.openai_base_url = openai_base_url;
            }
            if let Some(openai_model) = llm.openai_model {
                self.llm.openai_model = openai_model;
            }
            if let Some(google_model) = llm.google_model {
                self.llm.google_model = google_model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(tavily_api_key_value) = search.tavily_api_key {
                self.search.tavily_api_key = Some(secret_value(tavily_api_key_value));
            }
            if let Some(serper_api_key_value) = search.serper_api_key {
                self.search.serper_api_key = Some(secret_value(serper_api_key_value));
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(enabled) = cache.enabled {
                self.cache.enabled = enabled;
            }
            if let Some(url) = cache.url {
                self.cache.url = url;
            }
            if let Some(ttl_secs) = cache.ttl_secs {
                self.cache.ttl_secs = ttl_secs;
            }
        }

        if let Some(sourcing) = patch.sourcing {
            if let Some(max_suppliers) = sourcing.max_suppliers {
                self.sourcing.max_suppliers = max_suppliers;
            }
            if let Some(reports_dir) = sourcing.reports_dir {
                self.sourcing.reports_dir = PathBuf::from(reports_dir);
            }
            if let Some(dashboard_command) = sourcing.dashboard_command {
                self.sourcing.dashboard_command = Some(dashboard_command);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_aliased(&["SOURCING_OPENAI_API_KEY", "OPENAI_API_KEY"]) {
            self.llm.openai_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env_aliased(&["SOURCING_GOOGLE_API_KEY", "GOOGLE_API_KEY"]) {
            self.llm.google_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SOURCING_OPENAI_BASE_URL") {
            self.llm.openai_base_url = value;
        }
        if let Some(value) = read_env("SOURCING_OPENAI_MODEL") {
            self.llm.openai_model = value;
        }
        if let Some(value) = read_env("SOURCING_GOOGLE_MODEL") {
            self.llm.google_model = value;
        }
        if let Some(value) = read_env("SOURCING_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SOURCING_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_aliased(&["SOURCING_TAVILY_API_KEY", "TAVILY_API_KEY"]) {
            self.search.tavily_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env_aliased(&["SOURCING_SERPER_API_KEY", "SERPER_API_KEY"]) {
            self.search.serper_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SOURCING_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("SOURCING_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SOURCING_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SOURCING_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("SOURCING_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SOURCING_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("SOURCING_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SOURCING_CACHE_ENABLED") {
            self.cache.enabled = parse_bool("SOURCING_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SOURCING_CACHE_URL") {
            self.cache.url = value;
        }
        if let Some(value) = read_env("SOURCING_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_u64("SOURCING_CACHE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("SOURCING_MAX_SUPPLIERS") {
            self.sourcing.max_suppliers = parse_u32("SOURCING_MAX_SUPPLIERS", &value)?;
        }
        if let Some(value) = read_env("SOURCING_REPORTS_DIR") {
            self.sourcing.reports_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SOURCING_DASHBOARD_COMMAND") {
            self.sourcing.dashboard_command = Some(value);
        }

        let log_level =
            read_env("SOURCING_LOGGING_LEVEL").or_else(|| read_env("SOURCING_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SOURCING_LOGGING_FORMAT").or_else(|| read_env("SOURCING_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_suppliers) = overrides.max_suppliers {
            self.sourcing.max_suppliers = max_suppliers;
        }
        if let Some(reports_dir) = overrides.reports_dir {
            self.sourcing.reports_dir = reports_dir;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(self)?;
        validate_database(&self.database)?;
        validate_sourcing(&self.sourcing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("sourcing.toml"), PathBuf::from("config/sourcing.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(config: &AppConfig) -> Result<(), ConfigError> {
    if !config.has_openai() && !config.has_google() {
        return Err(ConfigError::Validation(
            "either llm.openai_api_key or llm.google_api_key must be set \
             (SOURCING_OPENAI_API_KEY / SOURCING_GOOGLE_API_KEY)"
                .to_string(),
        ));
    }

    if config.llm.timeout_secs == 0 || config.llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_sourcing(sourcing: &SourcingConfig) -> Result<(), ConfigError> {
    if sourcing.max_suppliers == 0 {
        return Err(ConfigError::Validation(
            "sourcing.max_suppliers must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_aliased(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    search: Option<SearchPatch>,
    database: Option<DatabasePatch>,
    cache: Option<CachePatch>,
    sourcing: Option<SourcingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    openai_api_key: Option<String>,
    google_api_key: Option<String>,
    openai_base_url: Option<String>,
    openai_model: Option<String>,
    google_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    tavily_api_key: Option<String>,
    serper_api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    enabled: Option<bool>,
    url: Option<String>,
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SourcingPatch {
    max_suppliers: Option<u32>,
    reports_dir: Option<String>,
    dashboard_command: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
