use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Adapter settings that outlive a single event
///
/// Per-event parameters (URLs, token, subject...) never live here; they are
/// parsed into [`crate::models::EventContext`] on every invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdapterConfig {
    /// Request-status polling
    #[serde(default)]
    pub poll: PollConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Remote alert conventions
    #[serde(default)]
    pub alert: AlertConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AdapterConfig {
    /// Load configuration from compiled-in defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        // An explicit path must exist; the env fallback is optional
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else if let Ok(env_path) = std::env::var("JSM_OPS_CONFIG") {
            builder = builder.add_source(config::File::with_name(&env_path).required(false));
        }

        builder
            // Override with environment variables (prefix: JSM_OPS)
            .add_source(
                config::Environment::with_prefix("JSM_OPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum request-status lookups per operation
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between lookups (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound for a single delay (milliseconds)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Delay growth between attempts
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff: BackoffStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    #[default]
    Fixed,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Display name used in log lines and error messages
    #[serde(default = "default_name")]
    pub name: String,

    /// `source` field sent with every payload
    #[serde(default = "default_source")]
    pub source: String,

    /// Authorization scheme prefixed to the token
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Path under the API base that accepts new alerts
    #[serde(default = "default_create_path")]
    pub create_path: String,

    /// Path under the web base that shows one alert
    #[serde(default = "default_link_path")]
    pub link_path: String,

    /// Correlation tag receiving the remote alert id
    #[serde(default = "default_issue_key_tag")]
    pub issue_key_tag: String,

    /// Correlation tag receiving the remote alert link
    #[serde(default = "default_issue_link_tag")]
    pub issue_link_tag: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            source: default_source(),
            auth_scheme: default_auth_scheme(),
            create_path: default_create_path(),
            link_path: default_link_path(),
            issue_key_tag: default_issue_key_tag(),
            issue_link_tag: default_issue_link_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_max_attempts() -> u32 {
    25
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "jsm-ops-adapter/1.0".to_string()
}

fn default_name() -> String {
    "JSM Ops".to_string()
}

fn default_source() -> String {
    "Zabbix".to_string()
}

fn default_auth_scheme() -> String {
    "GenieKey".to_string()
}

fn default_create_path() -> String {
    "alerts".to_string()
}

fn default_link_path() -> String {
    "alert/detail/".to_string()
}

fn default_issue_key_tag() -> String {
    "__zbx_ops_issuekey".to_string()
}

fn default_issue_link_tag() -> String {
    "__zbx_ops_issuelink".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
