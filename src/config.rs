use crate::error::{PipelineError, PipelineResult};
use crate::handler::retry::RetryPolicy;
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Runtime flavour. Development mirrors every logged error to the console and
/// exposes technical details in fallback screens; production does neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Read `APP_ENV`, falling back to the build profile.
    pub fn detect() -> PipelineResult<Self> {
        match std::env::var("APP_ENV") {
            Ok(value) => value.parse(),
            Err(_) if cfg!(debug_assertions) => Ok(Self::Development),
            Err(_) => Ok(Self::Production),
        }
    }
}

impl FromStr for Environment {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(PipelineError::configuration(format!(
                "Unknown APP_ENV value: {other}. Expected development or production"
            ))),
        }
    }
}

/// Queue and flush settings for the error logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Maximum rows written per store insert
    pub batch_size: usize,
    /// Interval between background flushes
    pub flush_interval: Duration,
    /// Pending rows kept before the oldest are dropped
    pub queue_capacity: usize,
    /// Value recorded in the `user_agent` column
    pub user_agent: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            flush_interval: Duration::from_secs(5),
            queue_capacity: 1_000,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Dismissal timeouts for blocking alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub alert_duration: Duration,
    pub critical_alert_duration: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            alert_duration: Duration::from_secs(6),
            critical_alert_duration: Duration::from_secs(10),
        }
    }
}

/// Known-good surfaces used for redirects and "go home" actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub login_url: String,
    pub home_url: String,
    /// Delay before the session-expiry redirect, so the alert can render first
    pub session_redirect_delay: Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_url: "/login".to_string(),
            home_url: "/".to_string(),
            session_redirect_delay: Duration::from_millis(1_500),
        }
    }
}

/// PostgREST (Supabase) error-log table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "error_logs".to_string(),
        }
    }
}

/// Full error pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub environment: Environment,
    pub logger: LoggerConfig,
    pub retry: RetryPolicy,
    pub notifications: NotificationConfig,
    pub navigation: NavigationConfig,
    /// Remote log store; `None` keeps logs in memory
    pub store: Option<RestStoreConfig>,
}

impl PipelineConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if:
    /// - `batch_size` or the flush interval is zero
    /// - `queue_capacity` is smaller than `batch_size`
    /// - a remote store is configured with an empty URL, key or table
    pub fn validate(&self) -> PipelineResult<()> {
        if self.logger.batch_size == 0 {
            return Err(PipelineError::configuration(
                "Logger batch size must be greater than zero",
            ));
        }
        if self.logger.queue_capacity < self.logger.batch_size {
            return Err(PipelineError::configuration(format!(
                "Logger queue capacity ({}) must be at least the batch size ({})",
                self.logger.queue_capacity, self.logger.batch_size
            )));
        }
        if self.logger.flush_interval.is_zero() {
            return Err(PipelineError::configuration(
                "Logger flush interval must be greater than zero",
            ));
        }
        if let Some(store) = &self.store {
            if store.base_url.trim().is_empty() {
                return Err(PipelineError::configuration(
                    "Error log store base URL is required",
                ));
            }
            if store.api_key.trim().is_empty() {
                return Err(PipelineError::configuration(
                    "Error log store API key is required",
                ));
            }
            if store.table.trim().is_empty() {
                return Err(PipelineError::configuration(
                    "Error log store table name is required",
                ));
            }
        }
        Ok(())
    }

    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `APP_ENV` | `environment` |
    /// | `ERROR_LOG_BATCH_SIZE` | `logger.batch_size` |
    /// | `ERROR_LOG_FLUSH_INTERVAL_MS` | `logger.flush_interval` |
    /// | `ERROR_LOG_QUEUE_CAPACITY` | `logger.queue_capacity` |
    /// | `ERROR_LOG_BASE_URL` | `store.base_url` (enables the remote store) |
    /// | `ERROR_LOG_API_KEY` | `store.api_key` |
    /// | `ERROR_LOG_TABLE` | `store.table` |
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if a variable is malformed or
    /// the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> PipelineResult<Self> {
        let mut config = Self {
            environment: Environment::detect()?,
            ..Self::default()
        };

        if let Some(batch_size) = parse_env::<usize>("ERROR_LOG_BATCH_SIZE")? {
            config.logger.batch_size = batch_size;
        }
        if let Some(interval_ms) = parse_env::<u64>("ERROR_LOG_FLUSH_INTERVAL_MS")? {
            config.logger.flush_interval = Duration::from_millis(interval_ms);
        }
        if let Some(capacity) = parse_env::<usize>("ERROR_LOG_QUEUE_CAPACITY")? {
            config.logger.queue_capacity = capacity;
        }

        config.store = Self::store_from_env();

        config.validate()?;

        log_debug!(
            environment = ?config.environment,
            batch_size = config.logger.batch_size,
            flush_interval_ms = config.logger.flush_interval.as_millis(),
            queue_capacity = config.logger.queue_capacity,
            has_remote_store = config.store.is_some(),
            "Error pipeline configuration loaded and validated"
        );

        Ok(config)
    }

    fn store_from_env() -> Option<RestStoreConfig> {
        let base_url = std::env::var("ERROR_LOG_BASE_URL").ok()?;
        let mut store = RestStoreConfig::new(
            base_url,
            std::env::var("ERROR_LOG_API_KEY").unwrap_or_default(),
        );
        if let Ok(table) = std::env::var("ERROR_LOG_TABLE") {
            store.table = table;
        }
        Some(store)
    }
}

/// Parse an optional environment variable, rejecting malformed values
fn parse_env<T: FromStr>(key: &str) -> PipelineResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            PipelineError::configuration(format!("Invalid value for {key}: {raw}"))
        }),
        Err(_) => Ok(None),
    }
}
