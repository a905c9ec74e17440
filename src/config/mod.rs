//! Configuration module for Catalog-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scraping {} pages", config.scraper.total_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffPolicy, Config, IdentityConfig, OutputConfig, ProxyConfig, ProxyDescriptor,
    SchedulerConfig, ScraperConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
