use serde::Deserialize;

/// Main configuration structure for Catalog-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site and retry behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Fixed origin of the catalog (e.g. "https://books.toscrape.com/")
    pub origin: String,

    /// Number of listing pages; pages 1..=total_pages are fetched
    #[serde(rename = "total-pages")]
    pub total_pages: u32,

    /// Attempts per page before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// How the delay grows between attempts
    #[serde(default)]
    pub backoff: BackoffPolicy,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Delay growth between fetch attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffPolicy {
    /// Wait the base delay before every retry
    #[default]
    Fixed,
    /// Double the base delay after every failed attempt
    Exponential,
}

/// Admission control for page tasks
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of page tasks running their fetch at once
    #[serde(rename = "max-concurrent-tasks", default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,

    /// Task starts admitted per window
    #[serde(rename = "requests-per-window", default = "default_requests_per_window")]
    pub requests_per_window: u32,

    /// Window length (milliseconds)
    #[serde(rename = "window-ms", default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            requests_per_window: default_requests_per_window(),
            window_ms: default_window_ms(),
        }
    }
}

/// Upstream proxy rotation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// Route requests through a randomly selected proxy
    #[serde(rename = "use-proxy", default)]
    pub use_proxy: bool,

    /// Available proxies
    #[serde(default)]
    pub servers: Vec<ProxyDescriptor>,
}

/// One upstream proxy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyDescriptor {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyDescriptor {
    /// Proxy URL without credentials, e.g. "http://10.0.0.1:8080"
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Credentials, only when the descriptor carries a username
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref().unwrap_or("")))
    }
}

/// Request identity pools
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Replaces the built-in user-agent pool when non-empty
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON list-of-objects file
    #[serde(rename = "json-path", default = "default_json_path")]
    pub json_path: String,

    /// Path of the flat tabular file
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: default_json_path(),
            csv_path: default_csv_path(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_tasks() -> u32 {
    1
}

fn default_requests_per_window() -> u32 {
    1
}

fn default_window_ms() -> u64 {
    800
}

fn default_json_path() -> String {
    "products.json".to_string()
}

fn default_csv_path() -> String {
    "products.csv".to_string()
}
