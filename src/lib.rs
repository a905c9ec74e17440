//! Catalog-Ripple: a polite catalog scraper
//!
//! This crate fetches paginated catalog listings with bounded concurrency,
//! rate limiting, retries and request-identity rotation, extracts product
//! records from each page, and hands the aggregate to output sinks.

pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Sink '{sink}' failed: {message}")]
    Sink { sink: String, message: String },
}

/// Configuration-specific errors
///
/// These are fatal: they surface once at startup and abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid proxy {proxy}: {message}")]
    InvalidProxy { proxy: String, message: String },
}

/// Failure of a single fetch attempt
///
/// Every variant is transient: the fetcher retries it until its attempt
/// budget runs out.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Failure of one logical page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        #[source]
        last: AttemptError,
    },
}

impl FetchError {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::ExhaustedRetries { attempts, .. } => *attempts,
        }
    }
}

/// A malformed field or element inside one page
///
/// Never aborts a page; the extractor logs it and degrades the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Unparseable price: {0:?}")]
    InvalidPrice(String),

    #[error("Unknown rating: {0:?}")]
    UnknownRating(String),

    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("Unresolvable product link: {0:?}")]
    InvalidLink(String),
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Pipeline, Record, ScrapeReport};
pub use output::{CsvSink, JsonSink, RunSummary, Sink};
